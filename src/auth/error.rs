// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failure of one of the request gates.
///
/// Messages are stable so clients and tests can match on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Neither a bearer header nor a `token` cookie was presented
    MissingToken,
    /// Signature mismatch, malformed payload or expired token
    InvalidToken,
    /// Role not admitted by the route
    Forbidden,
    /// Token could not be produced
    Internal(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    success: bool,
    message: String,
    error_code: &'static str,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::Forbidden => "forbidden",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Not authorized, no token"),
            AuthError::InvalidToken => write!(f, "Not authorized, token failed"),
            AuthError::Forbidden => write!(f, "Not authorized for this action"),
            AuthError::Internal(_) => write!(f, "Authentication service error"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(detail) = &self {
            tracing::error!(error = %detail, "token service failure");
        }
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            success: false,
            message: self.to_string(),
            error_code: self.error_code(),
        });
        (status, body).into_response()
    }
}
