// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response with the document store status.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// "UP" or "DOWN"
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    /// "connected" or "disconnected"
    pub database: String,
    pub environment: String,
}

/// Health check endpoint handler.
///
/// Returns 200 if the document store passes its health check, 503 otherwise.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database_ok = match state.storage().health_check() {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "document store health check failed");
            false
        }
    };

    let response = HealthResponse {
        status: if database_ok { "UP" } else { "DOWN" }.to_string(),
        timestamp: Utc::now(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        database: if database_ok { "connected" } else { "disconnected" }.to_string(),
        environment: state.config.environment.as_str().to_string(),
    };

    let status = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

#[cfg(test)]
mod tests {
    use axum::http::Method;
    use serde_json::json;

    use super::*;
    use crate::api::test_support::{json_request, send, TestApp};

    #[tokio::test]
    async fn healthy_store_reports_up() {
        let app = TestApp::new();
        let (status, body) = send(&app, json_request(Method::GET, "/health", None, json!(null))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "UP");
        assert_eq!(body["database"], "connected");
        assert_eq!(body["environment"], "test");
    }

    #[tokio::test]
    async fn health_is_also_served_under_api_prefix() {
        let app = TestApp::new();
        let (status, body) =
            send(&app, json_request(Method::GET, "/api/v1/health", None, json!(null))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "UP");
    }

    #[tokio::test]
    async fn missing_data_dir_reports_down() {
        let app = TestApp::new();
        std::fs::remove_dir_all(app.state.storage().paths().root()).unwrap();

        let (status, body) = send(&app, json_request(Method::GET, "/health", None, json!(null))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "DOWN");
        assert_eq!(body["database"], "disconnected");
    }
}
