// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent storage as JSON documents on the local filesystem, one file
//! per document under the configured data directory.
//!
//! ## Storage Layout
//!
//! ```text
//! <DATA_DIR>/
//!   users/{user_id}.json
//!   news/{news_id}.json
//!   advertisements/{ad_id}.json
//! ```
//!
//! ## Consistency
//!
//! - Each write atomically replaces a whole document
//! - There is no locking; concurrent writes to one document are last-write-wins
//! - Unique fields (user email, news title) are checked by scanning the
//!   collection before the write
//! - Validators in [`validation`] run explicitly in the repositories

pub mod document_store;
pub mod ownership;
pub mod paths;
pub mod repository;
pub mod validation;

pub use document_store::{DocumentStore, StorageError, StorageResult};
pub use ownership::{Action, OwnedResource, OwnershipDenied, OwnershipPolicy};
pub use paths::StoragePaths;
pub use repository::{
    AdPosition, AdvertisementRepository, NewsFilter, NewsRepository, NewsStatus,
    StoredAdvertisement, StoredNews, StoredUser, UserProfile, UserRepository, UserStatus,
};
