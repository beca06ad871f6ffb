// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Token authentication and role authorization for the newsroom API.
//!
//! ## Auth Flow
//!
//! 1. A user registers or logs in; the server issues a signed token
//!    (HS256) carrying `{id, role, email, name, exp}` and also sets it as an
//!    HttpOnly `token` cookie
//! 2. Clients send `Authorization: Bearer <token>` or the cookie
//! 3. The `Auth` extractor verifies the token and yields an [`Identity`]
//! 4. `Authorized<P>` additionally checks the identity's role against the
//!    route's role policy
//!
//! Ownership checks on individual documents live in
//! [`crate::storage::ownership`] and run after the document is loaded.
//!
//! ## Security
//!
//! - Tokens are never revoked server-side; they expire
//! - Verification uses zero clock leeway
//! - Passwords are stored as Argon2id hashes
//! - Reset tokens are stored as SHA-256 digests

pub mod claims;
pub mod error;
pub mod extractor;
pub mod password;
pub mod reset_token;
pub mod roles;
pub mod token;

pub use claims::{Identity, TokenClaims};
pub use error::AuthError;
pub use extractor::{
    AdManagers, AdminOnly, Admins, Auth, Authorized, NewsDeleters, NewsWriters, RolePolicy,
    TOKEN_COOKIE,
};
pub use roles::Role;
pub use token::TokenCodec;
