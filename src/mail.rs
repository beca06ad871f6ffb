// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Outbound mail delivery.
//!
//! Handlers depend on the [`Mailer`] trait. Production wires an
//! [`SmtpMailer`]; without SMTP settings the [`LogMailer`] records the
//! message in the log and reports success. Bodies carry reset links, so the
//! log-only mailer writes them at debug level and never in production.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpSettings;

/// A plain-text message to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid email address: {0}")]
    Address(String),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("message build failed: {0}")]
    Build(String),
    #[error("send failed: {0}")]
    Send(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

/// SMTP delivery through lettre's async transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_mailbox: Mailbox,
}

impl SmtpMailer {
    /// Build the transport. The connection is made lazily on first send.
    #[tracing::instrument(
        name = "smtp_mailer_new",
        skip(settings),
        fields(host = %settings.host, port = %settings.port, use_tls = %settings.use_tls)
    )]
    pub fn new(settings: &SmtpSettings) -> Result<Self, MailError> {
        let from_mailbox: Mailbox = format!("{} <{}>", settings.from_name, settings.from_address)
            .parse()
            .map_err(|e| MailError::Address(format!("{e}")))?;

        let builder = if settings.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                .map_err(|e| MailError::Connection(format!("{e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
        };

        let mut builder = builder.port(settings.port);
        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        tracing::debug!("SMTP mailer initialized");
        Ok(Self {
            transport: builder.build(),
            from_mailbox,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[tracing::instrument(name = "smtp_send", skip(self, message), fields(subject = %message.subject))]
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        let to: Mailbox = message
            .recipient
            .parse()
            .map_err(|e| MailError::Address(format!("{e}")))?;

        let email = Message::builder()
            .from(self.from_mailbox.clone())
            .to(to)
            .subject(message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.body)
            .map_err(|e| MailError::Build(format!("{e}")))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| MailError::Send(format!("{e}")))?;

        tracing::info!("email sent");
        Ok(())
    }
}

/// Mailer used when SMTP is not configured.
#[derive(Debug, Default, Clone)]
pub struct LogMailer {
    log_body: bool,
}

impl LogMailer {
    /// Only recipient and subject are logged.
    pub fn headers_only() -> Self {
        Self { log_body: false }
    }

    /// Also log the body at debug level, for local development.
    pub fn with_body() -> Self {
        Self { log_body: true }
    }

    /// The body as it may appear in the log, if at all.
    pub fn loggable_body<'m>(&self, message: &'m MailMessage) -> Option<&'m str> {
        self.log_body.then_some(message.body.as_str())
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        tracing::info!(
            recipient = %message.recipient,
            subject = %message.subject,
            "SMTP not configured; email logged instead of sent"
        );
        if let Some(body) = self.loggable_body(&message) {
            tracing::debug!(recipient = %message.recipient, body = %body, "unsent email body");
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SmtpSettings {
        SmtpSettings {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: Some("user".to_string()),
            password: Some("secret".to_string()),
            from_address: "noreply@example.com".to_string(),
            from_name: "Newsroom".to_string(),
            use_tls: true,
        }
    }

    #[tokio::test]
    async fn smtp_mailer_builds_from_settings() {
        assert!(SmtpMailer::new(&settings()).is_ok());
    }

    #[tokio::test]
    async fn smtp_mailer_rejects_bad_from_address() {
        let mut bad = settings();
        bad.from_address = "not an address".to_string();
        assert!(matches!(SmtpMailer::new(&bad), Err(MailError::Address(_))));
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        let message = MailMessage {
            recipient: "asha@example.com".to_string(),
            subject: "Hello".to_string(),
            body: "World".to_string(),
        };
        assert!(LogMailer::headers_only().send(message).await.is_ok());
    }

    #[test]
    fn headers_only_mailer_keeps_reset_links_out_of_the_log() {
        let message = MailMessage {
            recipient: "asha@example.com".to_string(),
            subject: "Password reset token".to_string(),
            body: "http://localhost:5000/api/v1/auth/resetpassword/secret-token".to_string(),
        };
        assert_eq!(LogMailer::headers_only().loggable_body(&message), None);
        assert_eq!(LogMailer::default().loggable_body(&message), None);
        assert_eq!(
            LogMailer::with_body().loggable_body(&message),
            Some(message.body.as_str())
        );
    }
}
