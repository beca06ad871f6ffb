// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Advertisement repository.
//!
//! Advertisements are stored as separate JSON files under `advertisements/`.
//! `created_by` is the owning user and is never reassigned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{
    paths::is_valid_document_id,
    validation::{required_text, validate_http_url, AD_TITLE_MAX},
    DocumentStore, OwnedResource, StorageError, StorageResult,
};

/// Page slot an advertisement is shown in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AdPosition {
    Header,
    Sidebar,
    Footer,
    InArticle,
    Popup,
    HomepageBanner,
}

impl AdPosition {
    pub const ALL: [AdPosition; 6] = [
        AdPosition::Header,
        AdPosition::Sidebar,
        AdPosition::Footer,
        AdPosition::InArticle,
        AdPosition::Popup,
        AdPosition::HomepageBanner,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AdPosition::Header => "header",
            AdPosition::Sidebar => "sidebar",
            AdPosition::Footer => "footer",
            AdPosition::InArticle => "in-article",
            AdPosition::Popup => "popup",
            AdPosition::HomepageBanner => "homepage-banner",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|position| position.as_str() == raw)
    }
}

/// Advertisement stored on disk and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredAdvertisement {
    pub id: String,
    pub title: String,
    /// Image URL
    pub image: String,
    /// Click-through target
    pub url: String,
    pub position: AdPosition,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub impressions: u64,
    /// Owner user ID
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl StoredAdvertisement {
    /// Whether the ad is active and `now` falls inside its run window.
    pub fn is_running_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.start_date <= now && now <= self.end_date
    }
}

impl OwnedResource for StoredAdvertisement {
    fn owner_user_id(&self) -> &str {
        &self.created_by
    }

    fn resource_kind(&self) -> &'static str {
        "advertisement"
    }

    fn resource_id(&self) -> &str {
        &self.id
    }
}

/// Normalize and validate the advertisement fields in place.
pub fn validate_advertisement(ad: &mut StoredAdvertisement) -> StorageResult<()> {
    ad.title = required_text("title", &ad.title, AD_TITLE_MAX)?;
    ad.image = ad.image.trim().to_string();
    if ad.image.is_empty() {
        return Err(StorageError::Validation(
            "Please provide an image for the advertisement".to_string(),
        ));
    }
    ad.url = validate_http_url(&ad.url)?;
    if ad.end_date <= ad.start_date {
        return Err(StorageError::Validation(
            "End date must be after start date".to_string(),
        ));
    }
    if ad.created_by.is_empty() {
        return Err(StorageError::Validation(
            "Advertisement must be associated with a user".to_string(),
        ));
    }
    Ok(())
}

/// Repository for advertisement documents.
pub struct AdvertisementRepository<'a> {
    storage: &'a DocumentStore,
}

impl<'a> AdvertisementRepository<'a> {
    pub fn new(storage: &'a DocumentStore) -> Self {
        Self { storage }
    }

    pub fn exists(&self, ad_id: &str) -> bool {
        is_valid_document_id(ad_id) && self.storage.exists(self.storage.paths().advertisement(ad_id))
    }

    pub fn get(&self, ad_id: &str) -> StorageResult<StoredAdvertisement> {
        if !self.exists(ad_id) {
            return Err(StorageError::NotFound(format!("Advertisement {ad_id}")));
        }
        self.storage.read_json(self.storage.paths().advertisement(ad_id))
    }

    pub fn create(&self, mut ad: StoredAdvertisement) -> StorageResult<StoredAdvertisement> {
        validate_advertisement(&mut ad)?;

        if self.exists(&ad.id) {
            return Err(StorageError::AlreadyExists(format!("Advertisement {}", ad.id)));
        }

        self.storage
            .write_json(self.storage.paths().advertisement(&ad.id), &ad)?;
        tracing::info!(ad_id = %ad.id, created_by = %ad.created_by, position = ad.position.as_str(), "advertisement created");
        Ok(ad)
    }

    pub fn update(&self, mut ad: StoredAdvertisement) -> StorageResult<StoredAdvertisement> {
        validate_advertisement(&mut ad)?;

        if !self.exists(&ad.id) {
            return Err(StorageError::NotFound(format!("Advertisement {}", ad.id)));
        }

        ad.updated_at = Utc::now();
        self.storage
            .write_json(self.storage.paths().advertisement(&ad.id), &ad)?;
        Ok(ad)
    }

    pub fn delete(&self, ad_id: &str) -> StorageResult<()> {
        if !self.exists(ad_id) {
            return Err(StorageError::NotFound(format!("Advertisement {ad_id}")));
        }
        self.storage.delete(self.storage.paths().advertisement(ad_id))
    }

    /// All advertisements, newest first.
    pub fn list_all(&self) -> StorageResult<Vec<StoredAdvertisement>> {
        let mut ads: Vec<StoredAdvertisement> = self
            .storage
            .load_all(self.storage.paths().advertisements_dir())?;
        ads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ads)
    }

    /// Running ads in `position`, each with one more impression recorded.
    pub fn serve_position(
        &self,
        position: AdPosition,
        now: DateTime<Utc>,
    ) -> StorageResult<Vec<StoredAdvertisement>> {
        let running: Vec<StoredAdvertisement> = self
            .list_all()?
            .into_iter()
            .filter(|ad| ad.position == position && ad.is_running_at(now))
            .collect();

        let mut served = Vec::with_capacity(running.len());
        for ad in running {
            match self.record_impression(&ad.id) {
                Ok(ad) => served.push(ad),
                // Deleted since the listing
                Err(StorageError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(served)
    }

    /// Increment the impression counter on the stored document.
    pub fn record_impression(&self, ad_id: &str) -> StorageResult<StoredAdvertisement> {
        self.bump(ad_id, |ad| ad.impressions = ad.impressions.saturating_add(1))
    }

    /// Increment the click counter.
    pub fn record_click(&self, ad_id: &str) -> StorageResult<StoredAdvertisement> {
        self.bump(ad_id, |ad| ad.clicks = ad.clicks.saturating_add(1))
    }

    /// Re-read the document and write back only the counter change.
    ///
    /// A document deleted in the meantime stays deleted.
    fn bump(
        &self,
        ad_id: &str,
        apply: impl FnOnce(&mut StoredAdvertisement),
    ) -> StorageResult<StoredAdvertisement> {
        let mut ad = self.get(ad_id)?;
        apply(&mut ad);
        if !self.exists(ad_id) {
            return Err(StorageError::NotFound(format!("Advertisement {ad_id}")));
        }
        self.storage
            .write_json(self.storage.paths().advertisement(&ad.id), &ad)?;
        Ok(ad)
    }
}
