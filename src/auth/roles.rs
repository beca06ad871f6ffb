// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles for authorization.
///
/// Roles are not hierarchical. Each route declares the exact set of roles it
/// admits, and each resource type declares which roles may override
/// ownership (see [`crate::storage::ownership`]).
///
/// - `Reader` - Registered user, reads content and manages own profile
/// - `Author` - Writes news articles
/// - `Editor` - Edits any article, manages advertisements
/// - `Admin` - Full access
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Reader,
    Author,
    Editor,
    Admin,
}

impl Role {
    /// All roles, in ascending order of privilege.
    pub const ALL: [Role; 4] = [Role::Reader, Role::Author, Role::Editor, Role::Admin];

    /// Parse role from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Role> {
        match s.trim().to_lowercase().as_str() {
            "reader" => Some(Role::Reader),
            "author" => Some(Role::Author),
            "editor" => Some(Role::Editor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Reader => "reader",
            Role::Author => "author",
            Role::Editor => "editor",
            Role::Admin => "admin",
        }
    }

    /// Whether this role is a member of `allowed`.
    pub fn is_in(&self, allowed: &[Role]) -> bool {
        allowed.contains(self)
    }
}

impl Default for Role {
    /// New accounts start as readers.
    fn default() -> Self {
        Role::Reader
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_parses_correctly() {
        assert_eq!(Role::from_str("admin"), Some(Role::Admin));
        assert_eq!(Role::from_str("EDITOR"), Some(Role::Editor));
        assert_eq!(Role::from_str(" Author "), Some(Role::Author));
        assert_eq!(Role::from_str("reader"), Some(Role::Reader));
        assert_eq!(Role::from_str("superuser"), None);
    }

    #[test]
    fn membership_is_exact() {
        let news_deleters = [Role::Author, Role::Admin];
        assert!(Role::Author.is_in(&news_deleters));
        assert!(Role::Admin.is_in(&news_deleters));
        assert!(!Role::Editor.is_in(&news_deleters));
        assert!(!Role::Reader.is_in(&news_deleters));
    }

    #[test]
    fn default_role_is_reader() {
        assert_eq!(Role::default(), Role::Reader);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Editor).unwrap(), "\"editor\"");
        let parsed: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(parsed, Role::Admin);
    }
}
