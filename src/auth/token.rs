// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed identity tokens (HS256 JWT).
//!
//! Tokens are stateless: there is no server-side revocation list, so a token
//! stays valid until its `exp` passes. Verification is all-or-nothing; any
//! signature, format or expiry problem yields [`AuthError::InvalidToken`].

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::{claims::TokenClaims, AuthError, Identity};

/// Issue a token for `identity`, signed with `secret`, valid for `ttl`.
pub fn issue(identity: &Identity, secret: &str, ttl: Duration) -> Result<String, AuthError> {
    TokenCodec::new(secret, ttl)?.issue(identity)
}

/// Verify a token signed with `secret` and return the identity it carries.
pub fn verify(token: &str, secret: &str) -> Result<Identity, AuthError> {
    TokenCodec::new(secret, Duration::ZERO)?.verify(token)
}

/// Token codec holding the derived signing keys.
///
/// Built once from configuration and shared through the application state.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenCodec {
    /// Create a codec for the given secret.
    ///
    /// An empty secret is a configuration fault.
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Internal("token signing secret is empty".to_string()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    /// Lifetime of issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token valid from now for the configured lifetime.
    pub fn issue(&self, identity: &Identity) -> Result<String, AuthError> {
        self.issue_at(identity, Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `issued_at`.
    pub fn issue_at(&self, identity: &Identity, issued_at: i64) -> Result<String, AuthError> {
        let ttl = i64::try_from(self.ttl.as_secs())
            .map_err(|_| AuthError::Internal("token lifetime out of range".to_string()))?;
        let claims = identity.to_claims(issued_at, issued_at.saturating_add(ttl));
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("token encoding failed: {e}")))
    }

    /// Verify signature, shape and expiry.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;

        let data = decode::<TokenClaims>(token, &self.decoding, &validation).map_err(|e| {
            tracing::debug!(error = %e, "token verification failed");
            AuthError::InvalidToken
        })?;

        Ok(data.claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    const SECRET: &str = "unit-test-secret";

    fn identity() -> Identity {
        Identity::new("u1", "Asha Rai", "asha@example.com", Role::Author)
    }

    #[test]
    fn issue_then_verify_round_trips() {
        let token = issue(&identity(), SECRET, Duration::from_secs(3600)).unwrap();
        let verified = verify(&token, SECRET).unwrap();
        assert_eq!(verified, identity());
    }

    #[test]
    fn every_role_round_trips() {
        let codec = TokenCodec::new(SECRET, Duration::from_secs(60)).unwrap();
        for role in Role::ALL {
            let who = Identity::new("u2", "N", "n@example.com", role);
            let token = codec.issue(&who).unwrap();
            assert_eq!(codec.verify(&token).unwrap().role, role);
        }
    }

    #[test]
    fn different_secret_is_rejected() {
        let token = issue(&identity(), SECRET, Duration::from_secs(3600)).unwrap();
        assert_eq!(verify(&token, "other-secret"), Err(AuthError::InvalidToken));
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = TokenCodec::new(SECRET, Duration::from_secs(60)).unwrap();
        let two_minutes_ago = Utc::now().timestamp() - 120;
        let token = codec.issue_at(&identity(), two_minutes_ago).unwrap();
        assert_eq!(codec.verify(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert_eq!(verify("not-a-token", SECRET), Err(AuthError::InvalidToken));
        assert_eq!(verify("a.b.c", SECRET), Err(AuthError::InvalidToken));
        assert_eq!(verify("", SECRET), Err(AuthError::InvalidToken));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

        let token = issue(&identity(), SECRET, Duration::from_secs(3600)).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged_claims = format!(
            r#"{{"id":"u1","role":"admin","email":"asha@example.com","name":"Asha Rai","iat":1,"exp":{}}}"#,
            Utc::now().timestamp() + 3600
        );
        let forged = format!(
            "{}.{}.{}",
            parts[0],
            URL_SAFE_NO_PAD.encode(forged_claims.as_bytes()),
            parts[2]
        );
        assert_eq!(verify(&forged, SECRET), Err(AuthError::InvalidToken));
    }

    #[test]
    fn empty_secret_is_a_configuration_fault() {
        assert!(matches!(
            TokenCodec::new("", Duration::from_secs(60)),
            Err(AuthError::Internal(_))
        ));
    }
}
