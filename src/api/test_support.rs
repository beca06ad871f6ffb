// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Router fixtures shared by the handler tests.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header::AUTHORIZATION, header::CONTENT_TYPE, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::{
    auth::{password::hash_password, Role},
    config::AppConfig,
    mail::{LogMailer, Mailer},
    state::AppState,
    storage::{StoredUser, UserRepository},
};

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    _temp_dir: TempDir,
}

impl TestApp {
    /// Password of every seeded user.
    pub const PASSWORD: &'static str = "password123";

    pub fn new() -> Self {
        Self::with_mailer(Arc::new(LogMailer::headers_only()))
    }

    pub fn with_mailer(mailer: Arc<dyn Mailer>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self::build(AppConfig::for_tests(temp_dir.path()), mailer, temp_dir)
    }

    pub fn with_config(configure: impl FnOnce(&mut AppConfig)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = AppConfig::for_tests(temp_dir.path());
        configure(&mut config);
        Self::build(config, Arc::new(LogMailer::headers_only()), temp_dir)
    }

    fn build(config: AppConfig, mailer: Arc<dyn Mailer>, temp_dir: TempDir) -> Self {
        let state = AppState::new(config, mailer).expect("Failed to build state");
        let router = super::router(state.clone());
        Self {
            state,
            router,
            _temp_dir: temp_dir,
        }
    }

    /// Store a user with [`Self::PASSWORD`] and return it with a fresh token.
    pub fn seed_user(&self, email: &str, role: Role) -> (StoredUser, String) {
        let name = email.split('@').next().unwrap_or("user").to_string();
        let mut user = StoredUser::new(name, email, hash_password(Self::PASSWORD).unwrap());
        user.role = role;
        let user = UserRepository::new(self.state.storage()).create(user).unwrap();
        let token = self.state.tokens.issue(&user.identity()).unwrap();
        (user, token)
    }

    pub async fn call(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// JSON request with an optional bearer token. A `null` body sends none.
pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    if body.is_null() {
        builder.body(Body::empty()).unwrap()
    } else {
        builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}

pub async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.call(request).await;
    let status = response.status();
    (status, body_json(response).await)
}
