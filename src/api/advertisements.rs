// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Advertisement endpoints.
//!
//! Listing, lookup, serving by position and click tracking are public.
//! Management requires the editor or admin role plus ownership of the ad
//! (admins may manage any ad).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use super::pagination::PageParams;
use crate::{
    auth::{AdManagers, Authorized},
    error::ApiError,
    models::{
        AdPlacement, AdvertisementListResponse, CreateAdvertisementRequest, DataResponse, Empty,
        PlacementResponse, UpdateAdvertisementRequest,
    },
    state::AppState,
    storage::{
        ownership::enforce, Action, AdPosition, AdvertisementRepository, OwnershipPolicy,
        StoredAdvertisement,
    },
};

/// List advertisements, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/advertisements",
    tag = "Advertisements",
    params(PageParams),
    responses(
        (status = 200, description = "Page of advertisements", body = AdvertisementListResponse)
    )
)]
pub async fn list_advertisements(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<AdvertisementListResponse>, ApiError> {
    let ads = AdvertisementRepository::new(state.storage()).list_all()?;
    let (data, total) = params.apply(ads);

    Ok(Json(AdvertisementListResponse {
        success: true,
        count: data.len(),
        pagination: params.neighbours(total),
        data,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/advertisements/{ad_id}",
    tag = "Advertisements",
    params(("ad_id" = String, Path, description = "Advertisement ID")),
    responses(
        (status = 200, body = DataResponse<StoredAdvertisement>),
        (status = 404, description = "Advertisement not found")
    )
)]
pub async fn get_advertisement(
    State(state): State<AppState>,
    Path(ad_id): Path<String>,
) -> Result<Json<DataResponse<StoredAdvertisement>>, ApiError> {
    let ad = AdvertisementRepository::new(state.storage()).get(&ad_id)?;
    Ok(Json(DataResponse::new(ad)))
}

/// Serve the running ads of one position, counting an impression for each.
#[utoipa::path(
    get,
    path = "/api/v1/advertisements/position/{position}",
    tag = "Advertisements",
    params(("position" = String, Path, description = "header, sidebar, footer, in-article, popup or homepage-banner")),
    responses(
        (status = 200, body = PlacementResponse),
        (status = 400, description = "Unknown position")
    )
)]
pub async fn advertisements_by_position(
    State(state): State<AppState>,
    Path(position): Path<String>,
) -> Result<Json<PlacementResponse>, ApiError> {
    let position = AdPosition::parse(&position)
        .ok_or_else(|| ApiError::bad_request(format!("Invalid position '{position}'")))?;

    let data: Vec<AdPlacement> = AdvertisementRepository::new(state.storage())
        .serve_position(position, Utc::now())?
        .into_iter()
        .map(AdPlacement::from)
        .collect();

    Ok(Json(PlacementResponse {
        success: true,
        count: data.len(),
        data,
    }))
}

/// Count a click-through.
#[utoipa::path(
    put,
    path = "/api/v1/advertisements/{ad_id}/click",
    tag = "Advertisements",
    params(("ad_id" = String, Path, description = "Advertisement ID")),
    responses(
        (status = 200, body = DataResponse<StoredAdvertisement>),
        (status = 404, description = "Advertisement not found")
    )
)]
pub async fn record_click(
    State(state): State<AppState>,
    Path(ad_id): Path<String>,
) -> Result<Json<DataResponse<StoredAdvertisement>>, ApiError> {
    let ad = AdvertisementRepository::new(state.storage()).record_click(&ad_id)?;
    Ok(Json(DataResponse::new(ad)))
}

/// Create an advertisement owned by the requester.
#[utoipa::path(
    post,
    path = "/api/v1/advertisements",
    tag = "Advertisements",
    security(("bearer" = [])),
    request_body = CreateAdvertisementRequest,
    responses(
        (status = 201, body = DataResponse<StoredAdvertisement>),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Editor or admin role required")
    )
)]
pub async fn create_advertisement(
    Authorized(user, _): Authorized<AdManagers>,
    State(state): State<AppState>,
    Json(request): Json<CreateAdvertisementRequest>,
) -> Result<(StatusCode, Json<DataResponse<StoredAdvertisement>>), ApiError> {
    let position = request
        .position
        .ok_or_else(|| ApiError::bad_request("Please specify the ad position"))?;
    let start_date = request
        .start_date
        .ok_or_else(|| ApiError::bad_request("Please provide a start date"))?;
    let end_date = request
        .end_date
        .ok_or_else(|| ApiError::bad_request("Please provide an end date"))?;

    let now = Utc::now();
    let ad = StoredAdvertisement {
        id: uuid::Uuid::new_v4().to_string(),
        title: request.title,
        image: request.image,
        url: request.url,
        position,
        start_date,
        end_date,
        is_active: request.is_active.unwrap_or(true),
        clicks: 0,
        impressions: 0,
        created_by: user.id.clone(),
        created_at: now,
        updated_at: now,
    };

    let ad = AdvertisementRepository::new(state.storage()).create(ad)?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(ad))))
}

/// Update an advertisement. Owners may edit their own; admins any.
#[utoipa::path(
    put,
    path = "/api/v1/advertisements/{ad_id}",
    tag = "Advertisements",
    security(("bearer" = [])),
    params(("ad_id" = String, Path, description = "Advertisement ID")),
    request_body = UpdateAdvertisementRequest,
    responses(
        (status = 200, body = DataResponse<StoredAdvertisement>),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Advertisement not found")
    )
)]
pub async fn update_advertisement(
    Authorized(user, _): Authorized<AdManagers>,
    State(state): State<AppState>,
    Path(ad_id): Path<String>,
    Json(request): Json<UpdateAdvertisementRequest>,
) -> Result<Json<DataResponse<StoredAdvertisement>>, ApiError> {
    let repo = AdvertisementRepository::new(state.storage());
    let mut ad = repo.get(&ad_id)?;
    enforce(&OwnershipPolicy::ADVERTISEMENTS, &ad, &user, Action::Update)?;

    if let Some(title) = request.title {
        ad.title = title;
    }
    if let Some(image) = request.image {
        ad.image = image;
    }
    if let Some(url) = request.url {
        ad.url = url;
    }
    if let Some(position) = request.position {
        ad.position = position;
    }
    if let Some(start_date) = request.start_date {
        ad.start_date = start_date;
    }
    if let Some(end_date) = request.end_date {
        ad.end_date = end_date;
    }
    if let Some(is_active) = request.is_active {
        ad.is_active = is_active;
    }

    let ad = repo.update(ad)?;
    tracing::info!(ad_id = %ad.id, user_id = %user.id, "advertisement updated");
    Ok(Json(DataResponse::new(ad)))
}

/// Delete an advertisement. Owners may delete their own; admins any.
#[utoipa::path(
    delete,
    path = "/api/v1/advertisements/{ad_id}",
    tag = "Advertisements",
    security(("bearer" = [])),
    params(("ad_id" = String, Path, description = "Advertisement ID")),
    responses(
        (status = 200, body = DataResponse<Empty>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Advertisement not found")
    )
)]
pub async fn delete_advertisement(
    Authorized(user, _): Authorized<AdManagers>,
    State(state): State<AppState>,
    Path(ad_id): Path<String>,
) -> Result<Json<DataResponse<Empty>>, ApiError> {
    let repo = AdvertisementRepository::new(state.storage());
    let ad = repo.get(&ad_id)?;
    enforce(&OwnershipPolicy::ADVERTISEMENTS, &ad, &user, Action::Delete)?;

    repo.delete(&ad.id)?;
    tracing::info!(ad_id = %ad.id, user_id = %user.id, "advertisement deleted");
    Ok(Json(DataResponse::new(Empty {})))
}
