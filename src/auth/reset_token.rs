// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! One-time password reset tokens.
//!
//! The plaintext token is mailed to the user; only its SHA-256 digest is
//! stored on the user document, next to an expiry instant.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};

use super::AuthError;

/// Lifetime of a reset token.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;

const RESET_TOKEN_BYTES: usize = 32;

/// A freshly generated reset token.
#[derive(Debug, Clone)]
pub struct ResetToken {
    /// Sent to the user, never stored
    pub plain: String,
    /// Stored on the user document
    pub digest: String,
    pub expires_at: DateTime<Utc>,
}

/// Generate a random reset token valid from `now`.
pub fn generate(now: DateTime<Utc>) -> Result<ResetToken, AuthError> {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AuthError::Internal("system randomness unavailable".to_string()))?;

    let plain = Base64UrlUnpadded::encode_string(&bytes);
    Ok(ResetToken {
        digest: digest(&plain),
        plain,
        expires_at: now + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
    })
}

/// Hex SHA-256 digest of a plaintext reset token.
pub fn digest(plain: &str) -> String {
    format!("{:x}", Sha256::digest(plain.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_hex() {
        let d = digest("abc");
        assert_eq!(
            d,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn generated_tokens_are_unique_and_hashed() {
        let now = Utc::now();
        let a = generate(now).unwrap();
        let b = generate(now).unwrap();

        assert_ne!(a.plain, b.plain);
        assert_eq!(a.digest, digest(&a.plain));
        assert_ne!(a.digest, a.plain);
        assert_eq!(a.expires_at, now + Duration::minutes(RESET_TOKEN_TTL_MINUTES));
    }
}
