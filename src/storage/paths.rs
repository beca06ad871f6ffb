// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path layout of the document store.

use std::path::{Path, PathBuf};

/// Default data directory, relative to the working directory.
pub const DATA_ROOT: &str = "./data";

/// Storage path utilities.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every collection directory, created at initialization.
    pub fn collection_dirs(&self) -> [PathBuf; 3] {
        [self.users_dir(), self.news_dir(), self.advertisements_dir()]
    }

    // ========== User Paths ==========

    pub fn users_dir(&self) -> PathBuf {
        self.root.join("users")
    }

    pub fn user(&self, user_id: &str) -> PathBuf {
        self.users_dir().join(format!("{user_id}.json"))
    }

    // ========== News Paths ==========

    pub fn news_dir(&self) -> PathBuf {
        self.root.join("news")
    }

    pub fn news(&self, news_id: &str) -> PathBuf {
        self.news_dir().join(format!("{news_id}.json"))
    }

    // ========== Advertisement Paths ==========

    pub fn advertisements_dir(&self) -> PathBuf {
        self.root.join("advertisements")
    }

    pub fn advertisement(&self, ad_id: &str) -> PathBuf {
        self.advertisements_dir().join(format!("{ad_id}.json"))
    }
}

/// Document ids become file names; only UUID-like ids are addressable.
pub fn is_valid_document_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
