// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account endpoints: registration, login, profile and password flows.
//!
//! Registration and the password flows are public. `logout`, `me`,
//! `updatedetails` and `updatepassword` require a token.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;

use crate::{
    auth::{
        password::{hash_password, verify_password},
        reset_token, Auth, Role, TOKEN_COOKIE,
    },
    error::ApiError,
    mail::MailMessage,
    models::{
        AuthResponse, DataResponse, ForgotPasswordRequest, LoginData, LoginRequest,
        MessageResponse, RegisterRequest, ResetPasswordRequest, UpdateDetailsRequest,
        UpdatePasswordRequest,
    },
    state::AppState,
    storage::{validation::normalize_tags, StoredUser, UserProfile, UserRepository, UserStatus},
};

/// Readable by the front end to pick a layout; carries no authority.
pub const ROLE_COOKIE: &str = "role";

fn token_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

fn role_cookie(role: Role, secure: bool) -> Cookie<'static> {
    Cookie::build((ROLE_COOKIE, role.as_str()))
        .path("/")
        .http_only(false)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Register a new reader account.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    if request.role.is_some_and(|role| role != Role::Reader) {
        tracing::info!(requested = ?request.role, "ignoring elevated role on registration");
    }

    let password_hash = hash_password(&request.password)?;
    let mut user = StoredUser::new(request.name, request.email, password_hash);
    if let Some(image) = request.profile_image {
        user.profile_image = image;
    }
    if let Some(bio) = request.bio {
        user.bio = bio;
    }
    user.favorite_categories = normalize_tags(request.favorite_categories);

    let user = UserRepository::new(state.storage()).create(user)?;
    let token = state.tokens.issue(&user.identity())?;

    Ok((StatusCode::CREATED, Json(AuthResponse::new(token, user))))
}

/// Log in with email and password.
///
/// Sets an HttpOnly `token` cookie and a readable `role` cookie.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = DataResponse<LoginData>),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account suspended or banned")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<DataResponse<LoginData>>), ApiError> {
    let repo = UserRepository::new(state.storage());

    let mut user = repo
        .find_by_email(&request.email)?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !verify_password(&request.password, &user.password_hash) {
        tracing::info!(user_id = %user.id, "login rejected: wrong password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    if user.status != UserStatus::Active {
        return Err(ApiError::forbidden(format!("Account is {}", user.status.as_str())));
    }

    user.last_login = Some(Utc::now());
    let user = repo.update(user)?;
    let token = state.tokens.issue(&user.identity())?;

    let secure = state.config.auth.cookie_secure;
    let jar = jar
        .add(token_cookie(token.clone(), secure))
        .add(role_cookie(user.role, secure));

    tracing::info!(user_id = %user.id, role = %user.role, "user logged in");
    Ok((
        jar,
        Json(DataResponse::new(LoginData {
            user: user.into(),
            token,
        })),
    ))
}

/// Clear the auth cookies. Issued tokens stay valid until they expire.
#[utoipa::path(
    get,
    path = "/api/v1/auth/logout",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn logout(Auth(user): Auth, jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar
        .remove(Cookie::build((TOKEN_COOKIE, "")).path("/"))
        .remove(Cookie::build((ROLE_COOKIE, "")).path("/"));

    tracing::info!(user_id = %user.id, "user logged out");
    (jar, Json(MessageResponse::new("Logged out successfully")))
}

/// The stored record of the requester.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, body = DataResponse<UserProfile>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Account no longer exists")
    )
)]
pub async fn me(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<DataResponse<UserProfile>>, ApiError> {
    let stored = UserRepository::new(state.storage()).get(&user.id)?;
    Ok(Json(DataResponse::new(stored.into())))
}

/// Change own name and/or email.
#[utoipa::path(
    put,
    path = "/api/v1/auth/updatedetails",
    tag = "Auth",
    security(("bearer" = [])),
    request_body = UpdateDetailsRequest,
    responses(
        (status = 200, body = DataResponse<UserProfile>),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn update_details(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<UpdateDetailsRequest>,
) -> Result<Json<DataResponse<UserProfile>>, ApiError> {
    let repo = UserRepository::new(state.storage());
    let mut stored = repo.get(&user.id)?;

    if let Some(name) = request.name {
        stored.name = name;
    }
    if let Some(email) = request.email {
        stored.email = email;
    }

    let stored = repo.update(stored)?;
    Ok(Json(DataResponse::new(stored.into())))
}

/// Change own password after confirming the current one.
#[utoipa::path(
    put,
    path = "/api/v1/auth/updatepassword",
    tag = "Auth",
    security(("bearer" = [])),
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password changed; new token issued", body = AuthResponse),
        (status = 400, description = "New password too short"),
        (status = 401, description = "Current password is incorrect")
    )
)]
pub async fn update_password(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<UpdatePasswordRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let repo = UserRepository::new(state.storage());
    let mut stored = repo.get(&user.id)?;

    if !verify_password(&request.current_password, &stored.password_hash) {
        return Err(ApiError::unauthorized("Password is incorrect"));
    }

    stored.password_hash = hash_password(&request.new_password)?;
    stored.clear_password_reset();
    let stored = repo.update(stored)?;

    let token = state.tokens.issue(&stored.identity())?;
    tracing::info!(user_id = %stored.id, "password changed");
    Ok(Json(AuthResponse::new(token, stored)))
}

/// Mail a one-time reset link valid for ten minutes.
#[utoipa::path(
    post,
    path = "/api/v1/auth/forgotpassword",
    tag = "Auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset mail sent", body = MessageResponse),
        (status = 404, description = "No user with that email"),
        (status = 500, description = "Email could not be sent")
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let repo = UserRepository::new(state.storage());
    let mut user = repo
        .find_by_email(&request.email)?
        .ok_or_else(|| ApiError::not_found("No user found with that email"))?;

    let reset = reset_token::generate(Utc::now())?;
    user.password_reset_token = Some(reset.digest);
    user.password_reset_expires = Some(reset.expires_at);
    let mut user = repo.update(user)?;

    let reset_url = format!(
        "{}/api/v1/auth/resetpassword/{}",
        state.config.public_url.trim_end_matches('/'),
        reset.plain
    );
    let message = MailMessage {
        recipient: user.email.clone(),
        subject: "Password reset token".to_string(),
        body: format!(
            "You are receiving this email because you (or someone else) has requested a \
             password reset. Please make a PUT request to:\n\n{reset_url}"
        ),
    };

    if let Err(e) = state.mailer.send(message).await {
        user.clear_password_reset();
        if let Err(cleanup) = repo.update(user) {
            tracing::error!(error = %cleanup, "failed to clear reset token after mail failure");
        }
        return Err(e.into());
    }

    Ok(Json(MessageResponse::new("Token sent to email")))
}

/// Set a new password with a reset token.
#[utoipa::path(
    put,
    path = "/api/v1/auth/resetpassword/{reset_token}",
    tag = "Auth",
    params(("reset_token" = String, Path, description = "Token from the reset mail")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset; new token issued", body = AuthResponse),
        (status = 400, description = "Token is invalid or has expired")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let repo = UserRepository::new(state.storage());
    let digest = reset_token::digest(&token);

    let mut user = repo
        .find_by_reset_digest(&digest, Utc::now())?
        .ok_or_else(|| ApiError::bad_request("Token is invalid or has expired"))?;

    user.password_hash = hash_password(&request.password)?;
    user.clear_password_reset();
    let user = repo.update(user)?;

    let token = state.tokens.issue(&user.identity())?;
    tracing::info!(user_id = %user.id, "password reset");
    Ok(Json(AuthResponse::new(token, user)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::{header::SET_COOKIE, Method};
    use serde_json::json;

    use super::*;
    use crate::{
        api::test_support::{json_request, send, TestApp},
        mail::testing::RecordingMailer,
    };

    #[tokio::test]
    async fn register_creates_reader_and_hashes_password() {
        let app = TestApp::new();
        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                json!({"name": "Asha", "email": "Asha@Example.com", "password": "secret1", "role": "admin"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["role"], "reader");
        assert_eq!(body["data"]["email"], "asha@example.com");
        assert!(body["data"].get("password_hash").is_none());

        let token = body["token"].as_str().unwrap();
        let identity = app.state.tokens.verify(token).unwrap();
        assert_eq!(identity.role, Role::Reader);

        let stored = UserRepository::new(app.state.storage())
            .find_by_email("asha@example.com")
            .unwrap()
            .unwrap();
        assert_ne!(stored.password_hash, "secret1");
        assert!(verify_password("secret1", &stored.password_hash));
    }

    #[tokio::test]
    async fn register_rejects_duplicates_and_short_passwords() {
        let app = TestApp::new();
        app.seed_user("asha@example.com", Role::Reader);

        let (status, _) = send(
            &app,
            json_request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                json!({"name": "Asha", "email": "asha@example.com", "password": "secret1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                json!({"name": "Bo", "email": "bo@example.com", "password": "123"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Password must be at least 6 characters");
    }

    #[tokio::test]
    async fn login_sets_cookies_and_rejects_bad_credentials() {
        let app = TestApp::new();
        app.seed_user("asha@example.com", Role::Author);

        let response = app
            .call(json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                json!({"email": "asha@example.com", "password": TestApp::PASSWORD}),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert!(cookies.iter().any(|c| c.starts_with("token=") && c.contains("HttpOnly")));
        assert!(cookies.iter().any(|c| c.starts_with("role=author")));

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                json!({"email": "asha@example.com", "password": "wrong-password"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");

        let (status, _) = send(
            &app,
            json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                json!({"email": "nobody@example.com", "password": "whatever"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn suspended_account_cannot_log_in() {
        let app = TestApp::new();
        let (mut user, _) = app.seed_user("asha@example.com", Role::Reader);
        user.status = UserStatus::Suspended;
        UserRepository::new(app.state.storage()).update(user).unwrap();

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                json!({"email": "asha@example.com", "password": TestApp::PASSWORD}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Account is suspended");
    }

    #[tokio::test]
    async fn me_requires_token_and_returns_record() {
        let app = TestApp::new();
        let (user, token) = app.seed_user("asha@example.com", Role::Editor);

        let (status, body) = send(&app, json_request(Method::GET, "/api/v1/auth/me", None, json!(null))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Not authorized, no token");

        let (status, body) = send(
            &app,
            json_request(Method::GET, "/api/v1/auth/me", Some(&token), json!(null)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], user.id);
    }

    #[tokio::test]
    async fn update_password_checks_current() {
        let app = TestApp::new();
        let (_, token) = app.seed_user("asha@example.com", Role::Reader);

        let (status, body) = send(
            &app,
            json_request(
                Method::PUT,
                "/api/v1/auth/updatepassword",
                Some(&token),
                json!({"current_password": "nope-nope", "new_password": "brand-new"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Password is incorrect");

        let (status, body) = send(
            &app,
            json_request(
                Method::PUT,
                "/api/v1/auth/updatepassword",
                Some(&token),
                json!({"current_password": TestApp::PASSWORD, "new_password": "brand-new"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].is_string());

        let stored = UserRepository::new(app.state.storage())
            .find_by_email("asha@example.com")
            .unwrap()
            .unwrap();
        assert!(verify_password("brand-new", &stored.password_hash));
    }

    #[tokio::test]
    async fn forgot_then_reset_password() {
        let mailer = Arc::new(RecordingMailer::default());
        let app = TestApp::with_mailer(mailer.clone());
        app.seed_user("asha@example.com", Role::Reader);

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/api/v1/auth/forgotpassword",
                None,
                json!({"email": "asha@example.com"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Token sent to email");

        let sent = mailer.messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "asha@example.com");
        let plain = sent[0].body.rsplit('/').next().unwrap().trim().to_string();

        // The stored value is the digest, never the mailed token
        let stored = UserRepository::new(app.state.storage())
            .find_by_email("asha@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(stored.password_reset_token, Some(reset_token::digest(&plain)));

        let (status, body) = send(
            &app,
            json_request(
                Method::PUT,
                &format!("/api/v1/auth/resetpassword/{plain}"),
                None,
                json!({"password": "after-reset"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].is_string());

        // Single use
        let (status, body) = send(
            &app,
            json_request(
                Method::PUT,
                &format!("/api/v1/auth/resetpassword/{plain}"),
                None,
                json!({"password": "again-again"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Token is invalid or has expired");
    }

    #[tokio::test]
    async fn forgot_password_mail_failure_clears_token() {
        let app = TestApp::with_mailer(Arc::new(RecordingMailer::failing()));
        app.seed_user("asha@example.com", Role::Reader);

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/api/v1/auth/forgotpassword",
                None,
                json!({"email": "asha@example.com"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Email could not be sent");

        let stored = UserRepository::new(app.state.storage())
            .find_by_email("asha@example.com")
            .unwrap()
            .unwrap();
        assert!(stored.password_reset_token.is_none());
        assert!(stored.password_reset_expires.is_none());
    }

    #[tokio::test]
    async fn forgot_password_unknown_email_is_404() {
        let app = TestApp::new();
        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/api/v1/auth/forgotpassword",
                None,
                json!({"email": "ghost@example.com"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "No user found with that email");
    }
}
