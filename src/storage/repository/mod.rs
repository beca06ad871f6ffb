// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the document store.
//!
//! Each repository validates documents on the way in and provides CRUD
//! operations for one collection.

pub mod advertisements;
pub mod news;
pub mod users;

pub use advertisements::{AdPosition, AdvertisementRepository, StoredAdvertisement};
pub use news::{NewsFilter, NewsRepository, NewsStatus, StoredNews};
pub use users::{StoredUser, UserProfile, UserRepository, UserStatus};
