// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User management endpoints.
//!
//! Listing, stats, lookup and deletion are admin-only. Any authenticated
//! user may update their own profile and favorite categories.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::pagination::PageParams;
use crate::{
    auth::{AdminOnly, Auth, Authorized},
    error::ApiError,
    models::{DataResponse, Empty, FavoritesRequest, PagedResponse, RoleCount, UpdateUserRequest},
    state::AppState,
    storage::{
        ownership::enforce, validation::validate_category, Action, OwnershipPolicy, UserProfile,
        UserRepository,
    },
};

/// List all users, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer" = [])),
    params(PageParams),
    responses(
        (status = 200, description = "Page of users", body = PagedResponse<UserProfile>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_users(
    _admin: AdminOnly,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<PagedResponse<UserProfile>>, ApiError> {
    let users = UserRepository::new(state.storage())
        .list_all()?
        .into_iter()
        .map(UserProfile::from)
        .collect();
    Ok(Json(params.paged(users)))
}

/// Number of users per role.
#[utoipa::path(
    get,
    path = "/api/v1/users/stats",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, body = DataResponse<Vec<RoleCount>>),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn user_stats(
    _admin: AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<DataResponse<Vec<RoleCount>>>, ApiError> {
    let counts = UserRepository::new(state.storage())
        .count_by_role()?
        .into_iter()
        .map(|(role, count)| RoleCount { role, count })
        .collect();
    Ok(Json(DataResponse::new(counts)))
}

/// Replace the requester's favorite categories.
#[utoipa::path(
    put,
    path = "/api/v1/users/favorites",
    tag = "Users",
    security(("bearer" = [])),
    request_body = FavoritesRequest,
    responses(
        (status = 200, body = DataResponse<UserProfile>),
        (status = 400, description = "Unknown category"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn update_favorites(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<FavoritesRequest>,
) -> Result<Json<DataResponse<UserProfile>>, ApiError> {
    let mut categories = Vec::with_capacity(request.categories.len());
    for raw in &request.categories {
        let category = validate_category(raw)?;
        if !categories.contains(&category) {
            categories.push(category);
        }
    }

    let repo = UserRepository::new(state.storage());
    let mut stored = repo.get(&user.id)?;
    stored.favorite_categories = categories;
    let stored = repo.update(stored)?;

    Ok(Json(DataResponse::new(stored.into())))
}

/// Get a single user.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, body = DataResponse<UserProfile>),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    _admin: AdminOnly,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<DataResponse<UserProfile>>, ApiError> {
    let user = UserRepository::new(state.storage()).get(&user_id)?;
    Ok(Json(DataResponse::new(user.into())))
}

/// Update a profile. Users may edit themselves; admins may edit anyone and
/// are the only ones whose `role` and `status` changes apply.
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("user_id" = String, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, body = DataResponse<UserProfile>),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the account owner"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<DataResponse<UserProfile>>, ApiError> {
    let repo = UserRepository::new(state.storage());
    let mut stored = repo.get(&user_id)?;
    enforce(&OwnershipPolicy::USERS, &stored, &user, Action::Update)?;

    if let Some(name) = request.name {
        stored.name = name;
    }
    if let Some(email) = request.email {
        stored.email = email;
    }
    if let Some(bio) = request.bio {
        stored.bio = bio;
    }
    if let Some(image) = request.profile_image {
        stored.profile_image = image;
    }

    if user.is_admin() {
        if let Some(role) = request.role {
            tracing::info!(admin_id = %user.id, user_id = %stored.id, %role, "role changed");
            stored.role = role;
        }
        if let Some(status) = request.status {
            tracing::info!(admin_id = %user.id, user_id = %stored.id, status = status.as_str(), "status changed");
            stored.status = status;
        }
    } else if request.role.is_some() || request.status.is_some() {
        tracing::debug!(user_id = %user.id, "ignoring role/status change from non-admin");
    }

    let stored = repo.update(stored)?;
    Ok(Json(DataResponse::new(stored.into())))
}

/// Delete a user.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("user_id" = String, Path, description = "User ID")),
    responses(
        (status = 200, body = DataResponse<Empty>),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    Authorized(admin, _): AdminOnly,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<DataResponse<Empty>>, ApiError> {
    UserRepository::new(state.storage()).delete(&user_id)?;
    tracing::info!(admin_id = %admin.id, user_id = %user_id, "user deleted");
    Ok(Json(DataResponse::new(Empty {})))
}
