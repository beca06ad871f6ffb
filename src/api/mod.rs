// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::time::Duration;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Request, State},
    http::{
        header::{self, HeaderName, HeaderValue},
        Method, StatusCode, Uri,
    },
    middleware::{from_fn_with_state, map_response},
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{Identity, Role},
    config::AppConfig,
    error::{ErrorBody, InternalDetail},
    models::{
        AdPlacement, CreateAdvertisementRequest, CreateNewsRequest, Empty, FavoritesRequest,
        ForgotPasswordRequest, LoginData, LoginRequest, MessageResponse, PageRef, Pagination,
        RegisterRequest, ResetPasswordRequest, RoleCount, TagsInput, UpdateAdvertisementRequest,
        UpdateDetailsRequest, UpdateNewsRequest, UpdatePasswordRequest, UpdateUserRequest,
    },
    state::AppState,
    storage::{AdPosition, NewsStatus, StoredAdvertisement, StoredNews, UserProfile, UserStatus},
};

pub mod advertisements;
pub mod auth;
pub mod health;
pub mod news;
pub mod pagination;
pub mod rate_limit;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

/// JSON bodies above this size are rejected with 413.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024;

const REQUEST_ID_HEADER: &str = "x-request-id";

const SECURITY_HEADERS: [(&str, &str); 6] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("permissions-policy", "geolocation=(), microphone=()"),
    (
        "content-security-policy",
        "default-src 'self'; script-src 'self' 'unsafe-inline'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; font-src 'self'; connect-src *",
    ),
];

pub fn router(state: AppState) -> Router {
    // Everything except /auth shares the per-client budget
    let limited_routes = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/stats", get(users::user_stats))
        .route("/users/favorites", put(users::update_favorites))
        .route(
            "/users/{user_id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/news", get(news::list_news).post(news::create_news))
        // One capture name per position: reads resolve a slug, writes an ID
        .route(
            "/news/{id}",
            get(news::get_news)
                .put(news::update_news)
                .delete(news::delete_news),
        )
        .route(
            "/advertisements",
            get(advertisements::list_advertisements).post(advertisements::create_advertisement),
        )
        .route(
            "/advertisements/position/{position}",
            get(advertisements::advertisements_by_position),
        )
        .route(
            "/advertisements/{ad_id}",
            get(advertisements::get_advertisement)
                .put(advertisements::update_advertisement)
                .delete(advertisements::delete_advertisement),
        )
        .route(
            "/advertisements/{ad_id}/click",
            put(advertisements::record_click),
        )
        .route_layer(from_fn_with_state(state.clone(), rate_limit::rate_limit));

    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", get(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/updatedetails", put(auth::update_details))
        .route("/auth/updatepassword", put(auth::update_password))
        .route("/auth/forgotpassword", post(auth::forgot_password))
        .route("/auth/resetpassword/{reset_token}", put(auth::reset_password))
        .route("/health", get(health::health));

    let v1_routes = auth_routes.merge(limited_routes);

    let mut app = Router::new()
        .route("/", get(welcome))
        .route("/health", get(health::health))
        .route("/api/v1", get(api_index))
        .nest("/api/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES));

    if !state.config.environment.is_production() {
        app = app.layer(map_response(expose_internal_detail));
    }

    for (name, value) in SECURITY_HEADERS {
        app = app.layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
    }

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    app.layer(cors_layer(&state.config))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        }))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .with_state(state)
}

/// Credentialed CORS restricted to the configured origins.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::PATCH,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
            header::ACCEPT,
            header::ORIGIN,
        ])
        .expose_headers([header::SET_COOKIE, header::DATE, header::ETAG])
        .max_age(Duration::from_secs(600))
}

/// Copy the diagnostic detail of an internal error into its JSON body.
///
/// Only mounted outside production.
pub async fn expose_internal_detail(response: Response) -> Response {
    let Some(internal) = response.extensions().get::<InternalDetail>().cloned() else {
        return response;
    };

    let body = ErrorBody {
        success: false,
        message: &internal.message,
        detail: Some(&internal.detail),
    };
    let Ok(bytes) = serde_json::to_vec(&body) else {
        return response;
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(bytes))
}

async fn welcome(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Welcome to the Newsroom API",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment.as_str(),
        "documentation": "/docs",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

async fn api_index() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Newsroom API - v1",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": {
                "register": "POST /api/v1/auth/register",
                "login": "POST /api/v1/auth/login",
                "logout": "GET /api/v1/auth/logout",
                "me": "GET /api/v1/auth/me",
                "updateDetails": "PUT /api/v1/auth/updatedetails",
                "updatePassword": "PUT /api/v1/auth/updatepassword",
                "forgotPassword": "POST /api/v1/auth/forgotpassword",
                "resetPassword": "PUT /api/v1/auth/resetpassword/{reset_token}",
            },
            "users": {
                "getUsers": "GET /api/v1/users",
                "stats": "GET /api/v1/users/stats",
                "favorites": "PUT /api/v1/users/favorites",
                "getUser": "GET /api/v1/users/{id}",
                "updateUser": "PUT /api/v1/users/{id}",
                "deleteUser": "DELETE /api/v1/users/{id}",
            },
            "news": {
                "getAllNews": "GET /api/v1/news",
                "getNewsByIdOrSlug": "GET /api/v1/news/{id_or_slug}",
                "createNews": "POST /api/v1/news",
                "updateNews": "PUT /api/v1/news/{id}",
                "deleteNews": "DELETE /api/v1/news/{id}",
            },
            "advertisements": {
                "getAll": "GET /api/v1/advertisements",
                "getById": "GET /api/v1/advertisements/{id}",
                "getByPosition": "GET /api/v1/advertisements/position/{position}",
                "click": "PUT /api/v1/advertisements/{id}/click",
                "create": "POST /api/v1/advertisements",
                "update": "PUT /api/v1/advertisements/{id}",
                "delete": "DELETE /api/v1/advertisements/{id}",
            },
        },
        "documentation": "/docs",
    }))
}

async fn not_found(method: Method, uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "Route not found",
            "requested_url": uri.to_string(),
            "method": method.as_str(),
            "suggestions": [
                "/api/v1/news",
                "/api/v1/auth/login",
                "/api/v1/auth/register",
                "/api/v1/advertisements",
            ],
        })),
    )
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::register,
        auth::login,
        auth::logout,
        auth::me,
        auth::update_details,
        auth::update_password,
        auth::forgot_password,
        auth::reset_password,
        users::list_users,
        users::user_stats,
        users::update_favorites,
        users::get_user,
        users::update_user,
        users::delete_user,
        news::list_news,
        news::get_news,
        news::create_news,
        news::update_news,
        news::delete_news,
        advertisements::list_advertisements,
        advertisements::get_advertisement,
        advertisements::advertisements_by_position,
        advertisements::record_click,
        advertisements::create_advertisement,
        advertisements::update_advertisement,
        advertisements::delete_advertisement
    ),
    components(
        schemas(
            Identity,
            Role,
            UserProfile,
            UserStatus,
            StoredNews,
            NewsStatus,
            StoredAdvertisement,
            AdPosition,
            AdPlacement,
            RegisterRequest,
            LoginRequest,
            LoginData,
            UpdateDetailsRequest,
            UpdatePasswordRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            UpdateUserRequest,
            FavoritesRequest,
            RoleCount,
            TagsInput,
            CreateNewsRequest,
            UpdateNewsRequest,
            CreateAdvertisementRequest,
            UpdateAdvertisementRequest,
            PageRef,
            Pagination,
            MessageResponse,
            Empty
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Auth", description = "Registration, login and password flows"),
        (name = "Users", description = "User management"),
        (name = "News", description = "News articles"),
        (name = "Advertisements", description = "Advertisement placements")
    )
)]
pub struct ApiDoc;
