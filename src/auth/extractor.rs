// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the authentication and authorization gates.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is Identity
//! }
//! ```
//!
//! and `Authorized<P>` to additionally require one of the roles of policy `P`:
//!
//! ```rust,ignore
//! async fn create_news(Authorized(user, _): Authorized<NewsWriters>) { .. }
//! ```

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;

use super::{AuthError, Identity, Role};
use crate::state::AppState;

/// Name of the cookie carrying the token.
pub const TOKEN_COOKIE: &str = "token";

/// Where the token was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Header,
    Cookie,
}

/// Pull the raw token out of the request.
///
/// An `Authorization: Bearer <token>` header wins over the `token` cookie.
/// A non-bearer authorization header is ignored.
pub fn extract_token(parts: &Parts) -> Option<(String, TokenSource)> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some((token.to_string(), TokenSource::Header));
    }

    CookieJar::from_headers(&parts.headers)
        .get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|token| !token.is_empty())
        .map(|token| (token, TokenSource::Cookie))
}

/// Extractor for authenticated users.
///
/// Resolves the identity from the token alone. There is no database lookup,
/// so a role change takes effect at the user's next login.
pub struct Auth(pub Identity);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Already resolved by an earlier extractor on this request
        if let Some(user) = parts.extensions.get::<Identity>().cloned() {
            return Ok(Auth(user));
        }

        let (token, source) = extract_token(parts).ok_or(AuthError::MissingToken)?;
        let user = state.tokens.verify(&token)?;

        tracing::debug!(user_id = %user.id, role = %user.role, ?source, "request authenticated");
        parts.extensions.insert(user.clone());
        Ok(Auth(user))
    }
}

/// A fixed set of roles admitted by a route.
pub trait RolePolicy {
    const ROLES: &'static [Role];
}

/// Role gate: pure predicate over the resolved identity.
pub fn authorize(identity: Option<&Identity>, allowed: &[Role]) -> Result<(), AuthError> {
    match identity {
        Some(user) if user.role.is_in(allowed) => Ok(()),
        Some(user) => {
            tracing::warn!(user_id = %user.id, role = %user.role, "authorization failed");
            Err(AuthError::Forbidden)
        }
        None => Err(AuthError::Forbidden),
    }
}

/// Extractor that requires authentication and one of `P::ROLES`.
pub struct Authorized<P: RolePolicy>(pub Identity, pub PhantomData<P>);

impl<P: RolePolicy> FromRequestParts<AppState> for Authorized<P> {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;
        authorize(Some(&user), P::ROLES)?;
        Ok(Authorized(user, PhantomData))
    }
}

/// `admin`
pub struct Admins;
impl RolePolicy for Admins {
    const ROLES: &'static [Role] = &[Role::Admin];
}

/// Roles that may create and edit news articles.
pub struct NewsWriters;
impl RolePolicy for NewsWriters {
    const ROLES: &'static [Role] = &[Role::Author, Role::Editor, Role::Admin];
}

/// Roles that may delete news articles. Editors are not among them.
pub struct NewsDeleters;
impl RolePolicy for NewsDeleters {
    const ROLES: &'static [Role] = &[Role::Author, Role::Admin];
}

/// Roles that may create, edit and delete advertisements.
pub struct AdManagers;
impl RolePolicy for AdManagers {
    const ROLES: &'static [Role] = &[Role::Editor, Role::Admin];
}

/// Extractor that requires admin role.
pub type AdminOnly = Authorized<Admins>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::http::{header::COOKIE, Request};
    use tempfile::TempDir;

    fn create_test_state() -> (AppState, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let state = AppState::for_tests(AppConfig::for_tests(temp_dir.path()))
            .expect("Failed to build state");
        (state, temp_dir)
    }

    fn parts_with(headers: &[(&str, String)]) -> Parts {
        let mut builder = Request::builder().uri("/test");
        for (name, value) in headers {
            builder = builder.header(*name, value.as_str());
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn token_for(state: &AppState, id: &str, role: Role) -> String {
        let who = Identity::new(id, "Test User", format!("{id}@example.com"), role);
        state.tokens.issue(&who).unwrap()
    }

    #[tokio::test]
    async fn auth_extractor_requires_a_token() {
        let (state, _temp_dir) = create_test_state();
        let mut parts = parts_with(&[]);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn auth_extractor_accepts_bearer_header() {
        let (state, _temp_dir) = create_test_state();
        let token = token_for(&state, "user_123", Role::Reader);
        let mut parts = parts_with(&[("Authorization", format!("Bearer {token}"))]);

        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.id, "user_123");
        assert_eq!(user.role, Role::Reader);
    }

    #[tokio::test]
    async fn auth_extractor_accepts_cookie() {
        let (state, _temp_dir) = create_test_state();
        let token = token_for(&state, "cookie_user", Role::Author);
        let mut parts = parts_with(&[(COOKIE.as_str(), format!("theme=dark; token={token}"))]);

        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.id, "cookie_user");
    }

    #[tokio::test]
    async fn header_takes_precedence_over_cookie() {
        let (state, _temp_dir) = create_test_state();
        let header_token = token_for(&state, "header_user", Role::Editor);
        let cookie_token = token_for(&state, "cookie_user", Role::Admin);
        let mut parts = parts_with(&[
            ("Authorization", format!("Bearer {header_token}")),
            (COOKIE.as_str(), format!("token={cookie_token}")),
        ]);

        assert_eq!(
            extract_token(&parts).map(|(_, source)| source),
            Some(TokenSource::Header)
        );
        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.id, "header_user");
    }

    #[tokio::test]
    async fn invalid_token_is_rejected_even_with_valid_cookie() {
        let (state, _temp_dir) = create_test_state();
        let cookie_token = token_for(&state, "cookie_user", Role::Admin);
        let mut parts = parts_with(&[
            ("Authorization", "Bearer garbage".to_string()),
            (COOKIE.as_str(), format!("token={cookie_token}")),
        ]);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn non_bearer_header_falls_back_to_cookie() {
        let (state, _temp_dir) = create_test_state();
        let cookie_token = token_for(&state, "cookie_user", Role::Reader);
        let parts = parts_with(&[
            ("Authorization", "Basic dXNlcjpwYXNz".to_string()),
            (COOKIE.as_str(), format!("token={cookie_token}")),
        ]);

        assert_eq!(
            extract_token(&parts).map(|(_, source)| source),
            Some(TokenSource::Cookie)
        );
    }

    #[test]
    fn authorize_checks_role_membership() {
        let editor = Identity::new("e1", "", "", Role::Editor);
        let admin = Identity::new("a1", "", "", Role::Admin);

        assert_eq!(authorize(Some(&editor), Admins::ROLES), Err(AuthError::Forbidden));
        assert_eq!(authorize(Some(&admin), Admins::ROLES), Ok(()));
        assert_eq!(authorize(None, Admins::ROLES), Err(AuthError::Forbidden));
    }

    #[test]
    fn news_deleters_exclude_editors() {
        let editor = Identity::new("e1", "", "", Role::Editor);
        assert_eq!(authorize(Some(&editor), NewsWriters::ROLES), Ok(()));
        assert_eq!(
            authorize(Some(&editor), NewsDeleters::ROLES),
            Err(AuthError::Forbidden)
        );
    }

    #[tokio::test]
    async fn admin_only_rejects_non_admin() {
        let (state, _temp_dir) = create_test_state();
        let token = token_for(&state, "user_123", Role::Editor);
        let mut parts = parts_with(&[("Authorization", format!("Bearer {token}"))]);

        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::Forbidden)));
    }

    #[tokio::test]
    async fn authorized_reports_missing_token_before_role() {
        let (state, _temp_dir) = create_test_state();
        let mut parts = parts_with(&[]);

        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }
}
