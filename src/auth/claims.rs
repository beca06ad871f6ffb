// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the request identity they resolve to.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Claims carried inside a signed token.
///
/// The identity fields are a snapshot of the user record at issuance time.
/// Role or email changes only reach new tokens, after the user logs in again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// User ID
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
}

/// The authenticated requester for the lifetime of one request.
///
/// This is the primary type handlers receive from the authentication gate.
/// It is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Identity {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Build the claims for this identity with the given validity window.
    pub fn to_claims(&self, issued_at: i64, expires_at: i64) -> TokenClaims {
        TokenClaims {
            id: self.id.clone(),
            role: self.role,
            email: self.email.clone(),
            name: self.name.clone(),
            iat: issued_at,
            exp: expires_at,
        }
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            id: claims.id,
            name: claims.name,
            email: claims.email,
            role: claims.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_round_trip_through_identity() {
        let identity = Identity::new("u1", "Asha", "asha@example.com", Role::Author);
        let claims = identity.to_claims(1_700_000_000, 1_700_003_600);
        assert_eq!(claims.exp, 1_700_003_600);
        assert_eq!(Identity::from(claims), identity);
    }

    #[test]
    fn missing_name_and_email_default_to_empty() {
        let claims: TokenClaims =
            serde_json::from_str(r#"{"id":"u9","role":"reader","iat":1,"exp":2}"#).unwrap();
        let identity = Identity::from(claims);
        assert_eq!(identity.name, "");
        assert_eq!(identity.email, "");
        assert_eq!(identity.role, Role::Reader);
    }

    #[test]
    fn is_admin_only_for_admin() {
        assert!(Identity::new("a", "", "", Role::Admin).is_admin());
        assert!(!Identity::new("e", "", "", Role::Editor).is_admin());
    }
}
