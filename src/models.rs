// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. Stored documents
//! ([`StoredNews`], [`StoredAdvertisement`]) and the public user view
//! ([`UserProfile`]) live in the storage layer and are returned as-is.
//!
//! Required request fields default to empty so a missing field is reported
//! by the field validators as a 400 with a readable message rather than as
//! a body deserialization failure.
//!
//! ## Envelope
//!
//! Successful responses carry `success: true` and the payload under `data`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::Role,
    storage::{
        validation::normalize_tags, AdPosition, NewsStatus, StoredAdvertisement, StoredNews,
        UserProfile, UserStatus,
    },
};

// =============================================================================
// Envelopes
// =============================================================================

/// `{success: true, data}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// `{success: true, message}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Serializes as `{}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Empty {}

/// Page of a filtered collection.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PagedResponse<T> {
    pub success: bool,
    /// Items on this page
    pub count: usize,
    /// Items across all pages
    pub total: usize,
    pub page: usize,
    pub pages: usize,
    pub data: Vec<T>,
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Ignored: new accounts are always readers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default)]
    pub favorite_categories: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// `{success, token, data: user}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub data: UserProfile,
}

impl AuthResponse {
    pub fn new(token: String, user: impl Into<UserProfile>) -> Self {
        Self {
            success: true,
            token,
            data: user.into(),
        }
    }
}

/// User profile with the issued token alongside.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginData {
    #[serde(flatten)]
    pub user: UserProfile,
    pub token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateDetailsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub password: String,
}

// =============================================================================
// Users
// =============================================================================

/// Profile changes. `role` and `status` apply only when an admin asks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct FavoritesRequest {
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RoleCount {
    pub role: Role,
    pub count: usize,
}

// =============================================================================
// News
// =============================================================================

/// Tags as a JSON array or a comma-separated string.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Csv(String),
}

impl TagsInput {
    pub fn into_tags(self) -> Vec<String> {
        match self {
            TagsInput::List(tags) => normalize_tags(tags),
            TagsInput::Csv(raw) => normalize_tags(raw.split(',')),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateNewsRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagsInput>,
    /// Defaults to `draft`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NewsStatus>,
    /// Image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateNewsRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagsInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<NewsStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Paged list of articles.
pub type NewsListResponse = PagedResponse<StoredNews>;

// =============================================================================
// Advertisements
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateAdvertisementRequest {
    #[serde(default)]
    pub title: String,
    /// Image URL
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<AdPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateAdvertisementRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<AdPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Neighbouring page reference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PageRef {
    pub page: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Pagination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdvertisementListResponse {
    pub success: bool,
    pub count: usize,
    pub pagination: Pagination,
    pub data: Vec<StoredAdvertisement>,
}

/// The fields a page needs to render a served ad.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AdPlacement {
    pub id: String,
    pub title: String,
    pub image: String,
    pub url: String,
    pub position: AdPosition,
}

impl From<StoredAdvertisement> for AdPlacement {
    fn from(ad: StoredAdvertisement) -> Self {
        Self {
            id: ad.id,
            title: ad.title,
            image: ad.image,
            url: ad.url,
            position: ad.position,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlacementResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<AdPlacement>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_accept_array_or_csv() {
        let list: TagsInput = serde_json::from_str(r#"[" nepal ", "", "politics"]"#).unwrap();
        assert_eq!(list.into_tags(), vec!["nepal", "politics"]);

        let csv: TagsInput = serde_json::from_str(r#""nepal, politics ,""#).unwrap();
        assert_eq!(csv.into_tags(), vec!["nepal", "politics"]);
    }

    #[test]
    fn empty_serializes_as_object() {
        assert_eq!(
            serde_json::to_string(&DataResponse::new(Empty {})).unwrap(),
            r#"{"success":true,"data":{}}"#
        );
    }

    #[test]
    fn pagination_omits_missing_neighbours() {
        let pagination = Pagination {
            next: Some(PageRef { page: 2, limit: 10 }),
            prev: None,
        };
        assert_eq!(
            serde_json::to_value(&pagination).unwrap(),
            serde_json::json!({"next": {"page": 2, "limit": 10}})
        );
    }

    #[test]
    fn missing_required_fields_default_to_empty() {
        let request: CreateNewsRequest = serde_json::from_str("{}").unwrap();
        assert!(request.title.is_empty());
        assert!(request.status.is_none());
    }
}
