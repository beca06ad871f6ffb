// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Instant;

use crate::{
    api::rate_limit::RateLimiter,
    auth::{AuthError, TokenCodec},
    config::AppConfig,
    mail::{LogMailer, MailError, Mailer, SmtpMailer},
    storage::{DocumentStore, StorageError, StoragePaths},
};

/// Failure while assembling the application state at startup.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("storage initialization failed: {0}")]
    Storage(#[from] StorageError),
    #[error("token codec setup failed: {0}")]
    Auth(#[from] AuthError),
    #[error("mailer setup failed: {0}")]
    Mail(#[from] MailError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    storage: DocumentStore,
    pub tokens: TokenCodec,
    pub mailer: Arc<dyn Mailer>,
    pub rate_limiter: Arc<RateLimiter>,
    pub started_at: Instant,
}

impl AppState {
    /// Initialize the document store and build the shared services.
    pub fn new(config: AppConfig, mailer: Arc<dyn Mailer>) -> Result<Self, StateError> {
        let mut storage = DocumentStore::new(StoragePaths::new(&config.data_dir));
        storage.initialize()?;

        let tokens = TokenCodec::new(&config.auth.jwt_secret, config.auth.token_ttl)?;
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit));

        Ok(Self {
            config: Arc::new(config),
            storage,
            tokens,
            mailer,
            rate_limiter,
            started_at: Instant::now(),
        })
    }

    /// State with the mailer chosen from configuration.
    pub fn from_config(config: AppConfig) -> Result<Self, StateError> {
        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(settings) => Arc::new(SmtpMailer::new(settings)?),
            None => {
                tracing::warn!("SMTP not configured; password reset mail will only be logged");
                if config.environment.is_production() {
                    Arc::new(LogMailer::headers_only())
                } else {
                    Arc::new(LogMailer::with_body())
                }
            }
        };
        Self::new(config, mailer)
    }

    /// State over a test configuration with a log-only mailer.
    pub fn for_tests(config: AppConfig) -> Result<Self, StateError> {
        Self::new(config, Arc::new(LogMailer::headers_only()))
    }

    pub fn storage(&self) -> &DocumentStore {
        &self.storage
    }
}
