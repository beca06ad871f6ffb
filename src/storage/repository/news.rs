// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! News article repository.
//!
//! Articles are stored as separate JSON files under `news/`. The `author`
//! field is the owning user and is never reassigned after creation.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{
    paths::is_valid_document_id,
    validation::{normalize_tags, required_text, slugify, validate_category, NEWS_TITLE_MAX},
    DocumentStore, OwnedResource, StorageError, StorageResult,
};

/// Publication state of an article.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NewsStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl NewsStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "draft" => Some(NewsStatus::Draft),
            "published" => Some(NewsStatus::Published),
            "archived" => Some(NewsStatus::Archived),
            _ => None,
        }
    }
}

/// Article stored on disk and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredNews {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Owner user ID
    pub author: String,
    #[serde(default)]
    pub views_count: u64,
    #[serde(default)]
    pub status: NewsStatus,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comments_count: u64,
    #[serde(default)]
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredNews {
    /// A new article owned by `author`. `published_at` follows `status`.
    pub fn new(
        author: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        category: impl Into<String>,
        status: NewsStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            content: content.into(),
            author: author.into(),
            views_count: 0,
            status,
            category: category.into(),
            tags: Vec::new(),
            image: String::new(),
            published_at: (status == NewsStatus::Published).then_some(now),
            comments_count: 0,
            slug: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `status`, stamping or clearing `published_at` on a change.
    pub fn set_status(&mut self, status: NewsStatus, now: DateTime<Utc>) {
        if self.status == status {
            return;
        }
        self.status = status;
        self.published_at = (status == NewsStatus::Published).then_some(now);
    }
}

impl OwnedResource for StoredNews {
    fn owner_user_id(&self) -> &str {
        &self.author
    }

    fn resource_kind(&self) -> &'static str {
        "news"
    }

    fn resource_id(&self) -> &str {
        &self.id
    }
}

/// Normalize and validate the article fields in place.
///
/// Derives the slug from the title when none is set.
pub fn validate_news(news: &mut StoredNews) -> StorageResult<()> {
    news.title = required_text("title", &news.title, NEWS_TITLE_MAX)?;
    if news.content.trim().is_empty() {
        return Err(StorageError::Validation(
            "Please provide content for the news article".to_string(),
        ));
    }
    if news.author.is_empty() {
        return Err(StorageError::Validation(
            "News must be associated with a user".to_string(),
        ));
    }
    news.category = validate_category(&news.category)?;
    news.tags = normalize_tags(&news.tags);
    news.image = news.image.trim().to_string();

    news.slug = news.slug.trim().to_lowercase();
    if news.slug.is_empty() {
        news.slug = slugify(&news.title, Utc::now().timestamp_millis());
    }
    Ok(())
}

/// Optional filters for listing articles.
#[derive(Debug, Clone, Default)]
pub struct NewsFilter {
    pub status: Option<NewsStatus>,
    /// Case-insensitive substring of the title
    pub title: Option<String>,
}

impl NewsFilter {
    fn matches(&self, news: &StoredNews) -> bool {
        if self.status.is_some_and(|status| status != news.status) {
            return false;
        }
        match &self.title {
            Some(needle) => news.title.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

/// Newest publication first; unpublished articles last, then newest created.
fn publication_order(a: &StoredNews, b: &StoredNews) -> Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Repository for news documents.
pub struct NewsRepository<'a> {
    storage: &'a DocumentStore,
}

impl<'a> NewsRepository<'a> {
    pub fn new(storage: &'a DocumentStore) -> Self {
        Self { storage }
    }

    pub fn exists(&self, news_id: &str) -> bool {
        is_valid_document_id(news_id) && self.storage.exists(self.storage.paths().news(news_id))
    }

    pub fn get(&self, news_id: &str) -> StorageResult<StoredNews> {
        if !self.exists(news_id) {
            return Err(StorageError::NotFound(format!("News article {news_id}")));
        }
        self.storage.read_json(self.storage.paths().news(news_id))
    }

    /// Resolve by document ID, else by slug.
    pub fn get_by_id_or_slug(&self, id_or_slug: &str) -> StorageResult<StoredNews> {
        if self.exists(id_or_slug) {
            return self.get(id_or_slug);
        }
        let slug = id_or_slug.trim().to_lowercase();
        // Oldest claim wins if duplicates ever reach disk
        self.storage
            .load_all::<StoredNews>(self.storage.paths().news_dir())?
            .into_iter()
            .filter(|news| news.slug == slug)
            .min_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
            .ok_or_else(|| StorageError::NotFound(format!("News article {id_or_slug}")))
    }

    /// Validate and store a new article. Titles and slugs are unique; a
    /// colliding slug gets a numeric suffix.
    pub fn create(&self, mut news: StoredNews) -> StorageResult<StoredNews> {
        validate_news(&mut news)?;

        if self.exists(&news.id) {
            return Err(StorageError::AlreadyExists(format!("News article {}", news.id)));
        }
        self.ensure_title_free(&news.title, &news.id)?;
        news.slug = self.free_slug(&news.slug, &news.id)?;

        self.storage
            .write_json(self.storage.paths().news(&news.id), &news)?;
        tracing::info!(news_id = %news.id, author = %news.author, "news article created");
        Ok(news)
    }

    /// Validate and replace an existing article.
    pub fn update(&self, mut news: StoredNews) -> StorageResult<StoredNews> {
        validate_news(&mut news)?;

        if !self.exists(&news.id) {
            return Err(StorageError::NotFound(format!("News article {}", news.id)));
        }
        self.ensure_title_free(&news.title, &news.id)?;
        if self.slug_taken(&news.slug, &news.id)? {
            return Err(StorageError::AlreadyExists(format!("News article with slug '{}'", news.slug)));
        }

        news.updated_at = Utc::now();
        self.storage
            .write_json(self.storage.paths().news(&news.id), &news)?;
        Ok(news)
    }

    pub fn delete(&self, news_id: &str) -> StorageResult<()> {
        if !self.exists(news_id) {
            return Err(StorageError::NotFound(format!("News article {news_id}")));
        }
        self.storage.delete(self.storage.paths().news(news_id))
    }

    /// Matching articles in publication order.
    pub fn list(&self, filter: &NewsFilter) -> StorageResult<Vec<StoredNews>> {
        let mut articles: Vec<StoredNews> = self
            .storage
            .load_all::<StoredNews>(self.storage.paths().news_dir())?
            .into_iter()
            .filter(|news| filter.matches(news))
            .collect();
        articles.sort_by(publication_order);
        Ok(articles)
    }

    /// Increment the view counter and return the article as stored.
    ///
    /// Re-reads the document so only the counter changes. Concurrent views
    /// may be lost; a deleted article stays deleted.
    pub fn record_view(&self, news_id: &str) -> StorageResult<StoredNews> {
        let mut news = self.get(news_id)?;
        news.views_count = news.views_count.saturating_add(1);
        if !self.exists(news_id) {
            return Err(StorageError::NotFound(format!("News article {news_id}")));
        }
        self.storage
            .write_json(self.storage.paths().news(&news.id), &news)?;
        Ok(news)
    }

    fn slug_taken(&self, slug: &str, own_id: &str) -> StorageResult<bool> {
        Ok(self
            .storage
            .load_all::<StoredNews>(self.storage.paths().news_dir())?
            .iter()
            .any(|other| other.slug == slug && other.id != own_id))
    }

    /// `base`, or `base-2`, `base-3`, ... whichever no other article uses.
    fn free_slug(&self, base: &str, own_id: &str) -> StorageResult<String> {
        let taken: Vec<String> = self
            .storage
            .load_all::<StoredNews>(self.storage.paths().news_dir())?
            .into_iter()
            .filter(|other| other.id != own_id)
            .map(|other| other.slug)
            .collect();

        let mut candidate = base.to_string();
        let mut suffix = 2u32;
        while taken.iter().any(|slug| *slug == candidate) {
            candidate = format!("{base}-{suffix}");
            suffix += 1;
        }
        Ok(candidate)
    }

    fn ensure_title_free(&self, title: &str, own_id: &str) -> StorageResult<()> {
        let taken = self
            .storage
            .load_all::<StoredNews>(self.storage.paths().news_dir())?
            .iter()
            .any(|other| other.title == title && other.id != own_id);
        if taken {
            return Err(StorageError::AlreadyExists(format!("News article titled '{title}'")));
        }
        Ok(())
    }
}
