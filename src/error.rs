// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Controller error type and its JSON rendering.
//!
//! Every failure renders as `{"success": false, "message": ...}`. Internal
//! errors carry a diagnostic detail that is attached to the response as an
//! [`InternalDetail`] extension; the router adds it to the body only outside
//! production (see [`crate::api::expose_internal_detail`]).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{
    auth::{password::PasswordError, AuthError},
    mail::MailError,
    storage::{OwnershipDenied, StorageError},
};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    /// Diagnostic text for internal errors
    pub detail: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct ErrorBody<'a> {
    pub success: bool,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<&'a str>,
}

/// Diagnostic detail of an internal error, carried on the response.
#[derive(Debug, Clone)]
pub struct InternalDetail {
    pub message: String,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }

    /// Generic 500 carrying `detail` for diagnostics.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::internal_with_message("Server Error", detail)
    }

    pub fn internal_with_message(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            detail: Some(detail.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status,
                message = %self.message,
                detail = self.detail.as_deref().unwrap_or(""),
                "request failed"
            );
        }

        let body = Json(ErrorBody {
            success: false,
            message: &self.message,
            detail: None,
        });
        let mut response = (self.status, body).into_response();
        if let Some(detail) = self.detail {
            response.extensions_mut().insert(InternalDetail {
                message: self.message,
                detail,
            });
        }
        response
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(_) => ApiError::not_found(e.to_string()),
            StorageError::AlreadyExists(_) => ApiError::conflict(e.to_string()),
            StorageError::Validation(message) => ApiError::bad_request(message),
            StorageError::Io(_) | StorageError::Json(_) | StorageError::NotInitialized => {
                ApiError::internal(e.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match &e {
            AuthError::Internal(detail) => ApiError::internal_with_message(e.to_string(), detail),
            _ => ApiError::new(e.status_code(), e.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::TooShort => ApiError::bad_request(e.to_string()),
            PasswordError::Hash(detail) => ApiError::internal(detail),
        }
    }
}

impl From<OwnershipDenied> for ApiError {
    fn from(e: OwnershipDenied) -> Self {
        ApiError::forbidden(e.to_string())
    }
}

impl From<MailError> for ApiError {
    fn from(e: MailError) -> Self {
        ApiError::internal_with_message("Email could not be sent", e.to_string())
    }
}
