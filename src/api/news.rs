// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! News article endpoints.
//!
//! Reads are public. Writes pass two gates: the role gate on the route and
//! the ownership check against the loaded article.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;

use super::pagination::PageParams;
use crate::{
    auth::{Authorized, NewsDeleters, NewsWriters},
    error::ApiError,
    models::{CreateNewsRequest, DataResponse, MessageResponse, NewsListResponse, UpdateNewsRequest},
    state::AppState,
    storage::{
        ownership::enforce, Action, NewsFilter, NewsRepository, NewsStatus, OwnershipPolicy,
        StorageError, StoredNews,
    },
};

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NewsListQuery {
    /// 1-based page number (default 1)
    pub page: Option<usize>,
    /// Items per page (default 10)
    pub limit: Option<usize>,
    /// `draft`, `published` or `archived`; all when absent
    pub status: Option<String>,
    /// Case-insensitive title substring
    pub title: Option<String>,
}

impl NewsListQuery {
    fn filter(&self) -> Result<NewsFilter, ApiError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                NewsStatus::parse(raw)
                    .ok_or_else(|| ApiError::bad_request(format!("Invalid status '{raw}'")))?,
            ),
        };
        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .map(str::to_string);
        Ok(NewsFilter { status, title })
    }
}

/// List articles, newest publication first.
#[utoipa::path(
    get,
    path = "/api/v1/news",
    tag = "News",
    params(NewsListQuery),
    responses(
        (status = 200, description = "Page of articles", body = NewsListResponse),
        (status = 400, description = "Invalid status filter")
    )
)]
pub async fn list_news(
    State(state): State<AppState>,
    Query(query): Query<NewsListQuery>,
) -> Result<Json<NewsListResponse>, ApiError> {
    let filter = query.filter()?;
    let articles = NewsRepository::new(state.storage()).list(&filter)?;

    let page = PageParams {
        page: query.page,
        limit: query.limit,
    };
    Ok(Json(page.paged(articles)))
}

/// Get an article by ID or slug and count the view.
#[utoipa::path(
    get,
    path = "/api/v1/news/{id_or_slug}",
    tag = "News",
    params(("id_or_slug" = String, Path, description = "Article ID or slug")),
    responses(
        (status = 200, body = DataResponse<StoredNews>),
        (status = 404, description = "News article not found")
    )
)]
pub async fn get_news(
    State(state): State<AppState>,
    Path(id_or_slug): Path<String>,
) -> Result<Json<DataResponse<StoredNews>>, ApiError> {
    let repo = NewsRepository::new(state.storage());
    let news = repo.get_by_id_or_slug(&id_or_slug)?;

    // A lost view count must not fail the read
    let news = match repo.record_view(&news.id) {
        Ok(viewed) => viewed,
        Err(e @ StorageError::NotFound(_)) => return Err(e.into()),
        Err(e) => {
            tracing::warn!(news_id = %news.id, error = %e, "failed to record view");
            news
        }
    };

    Ok(Json(DataResponse::new(news)))
}

/// Create an article owned by the requester.
#[utoipa::path(
    post,
    path = "/api/v1/news",
    tag = "News",
    security(("bearer" = [])),
    request_body = CreateNewsRequest,
    responses(
        (status = 201, body = DataResponse<StoredNews>),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Role may not write news"),
        (status = 409, description = "Title already used")
    )
)]
pub async fn create_news(
    Authorized(user, _): Authorized<NewsWriters>,
    State(state): State<AppState>,
    Json(request): Json<CreateNewsRequest>,
) -> Result<(StatusCode, Json<DataResponse<StoredNews>>), ApiError> {
    let mut news = StoredNews::new(
        &user.id,
        request.title,
        request.content,
        request.category,
        request.status.unwrap_or_default(),
    );
    if let Some(tags) = request.tags {
        news.tags = tags.into_tags();
    }
    if let Some(image) = request.image {
        news.image = image;
    }

    let news = NewsRepository::new(state.storage()).create(news)?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(news))))
}

/// Update an article. Owners may edit their own; editors and admins any.
#[utoipa::path(
    put,
    path = "/api/v1/news/{news_id}",
    tag = "News",
    security(("bearer" = [])),
    params(("news_id" = String, Path, description = "Article ID")),
    request_body = UpdateNewsRequest,
    responses(
        (status = 200, body = DataResponse<StoredNews>),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "News article not found")
    )
)]
pub async fn update_news(
    Authorized(user, _): Authorized<NewsWriters>,
    State(state): State<AppState>,
    Path(news_id): Path<String>,
    Json(request): Json<UpdateNewsRequest>,
) -> Result<Json<DataResponse<StoredNews>>, ApiError> {
    let repo = NewsRepository::new(state.storage());
    let mut news = repo.get(&news_id)?;
    enforce(&OwnershipPolicy::NEWS, &news, &user, Action::Update)?;

    if let Some(title) = request.title {
        news.title = title;
    }
    if let Some(content) = request.content {
        news.content = content;
    }
    if let Some(category) = request.category {
        news.category = category;
    }
    if let Some(tags) = request.tags {
        news.tags = tags.into_tags();
    }
    if let Some(image) = request.image {
        news.image = image;
    }
    if let Some(status) = request.status {
        news.set_status(status, Utc::now());
    }

    let news = repo.update(news)?;
    tracing::info!(news_id = %news.id, user_id = %user.id, "news article updated");
    Ok(Json(DataResponse::new(news)))
}

/// Delete an article. Owners may delete their own; admins any.
#[utoipa::path(
    delete,
    path = "/api/v1/news/{news_id}",
    tag = "News",
    security(("bearer" = [])),
    params(("news_id" = String, Path, description = "Article ID")),
    responses(
        (status = 200, body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "News article not found")
    )
)]
pub async fn delete_news(
    Authorized(user, _): Authorized<NewsDeleters>,
    State(state): State<AppState>,
    Path(news_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let repo = NewsRepository::new(state.storage());
    let news = repo.get(&news_id)?;
    enforce(&OwnershipPolicy::NEWS, &news, &user, Action::Delete)?;

    repo.delete(&news.id)?;
    tracing::info!(news_id = %news.id, user_id = %user.id, "news article deleted");
    Ok(Json(MessageResponse::new("News article deleted")))
}
