// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User repository.
//!
//! Each user is stored as a separate JSON file under `users/`. The stored
//! document carries the password hash and any pending reset digest; API
//! responses use [`UserProfile`], which carries neither.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{
    paths::is_valid_document_id,
    validation::{optional_text, required_text, validate_email, USER_BIO_MAX, USER_NAME_MAX},
    DocumentStore, OwnedResource, StorageError, StorageResult,
};
use crate::auth::{Identity, Role};

pub const DEFAULT_PROFILE_IMAGE: &str = "default-profile.jpg";

/// Account standing. Only active accounts may log in.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Suspended,
    Banned,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
            UserStatus::Banned => "banned",
        }
    }
}

/// User document as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Argon2id PHC string, never the plaintext
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    pub profile_image: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub favorite_categories: Vec<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: UserStatus,
    /// SHA-256 hex digest of the outstanding reset token
    #[serde(default)]
    pub password_reset_token: Option<String>,
    #[serde(default)]
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredUser {
    /// A fresh `reader` account. `password_hash` must already be hashed.
    pub fn new(name: impl Into<String>, email: impl Into<String>, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
            password_hash,
            role: Role::Reader,
            profile_image: DEFAULT_PROFILE_IMAGE.to_string(),
            bio: String::new(),
            favorite_categories: Vec::new(),
            is_verified: false,
            last_login: None,
            status: UserStatus::Active,
            password_reset_token: None,
            password_reset_expires: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Identity snapshot embedded in issued tokens.
    pub fn identity(&self) -> Identity {
        Identity::new(&self.id, &self.name, &self.email, self.role)
    }

    pub fn clear_password_reset(&mut self) {
        self.password_reset_token = None;
        self.password_reset_expires = None;
    }
}

impl OwnedResource for StoredUser {
    fn owner_user_id(&self) -> &str {
        &self.id
    }

    fn resource_kind(&self) -> &'static str {
        "user"
    }

    fn resource_id(&self) -> &str {
        &self.id
    }
}

/// Public view of a user (API response).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub profile_image: String,
    pub bio: String,
    pub favorite_categories: Vec<String>,
    pub is_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredUser> for UserProfile {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            profile_image: user.profile_image,
            bio: user.bio,
            favorite_categories: user.favorite_categories,
            is_verified: user.is_verified,
            last_login: user.last_login,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Normalize and validate the user fields in place.
pub fn validate_user(user: &mut StoredUser) -> StorageResult<()> {
    user.name = required_text("name", &user.name, USER_NAME_MAX)?;
    user.email = validate_email(&user.email)?;
    user.bio = optional_text("bio", &user.bio, USER_BIO_MAX)?;
    if user.password_hash.is_empty() {
        return Err(StorageError::Validation("Please provide a password".to_string()));
    }
    if user.profile_image.trim().is_empty() {
        user.profile_image = DEFAULT_PROFILE_IMAGE.to_string();
    }
    Ok(())
}

/// Repository for user documents.
pub struct UserRepository<'a> {
    storage: &'a DocumentStore,
}

impl<'a> UserRepository<'a> {
    pub fn new(storage: &'a DocumentStore) -> Self {
        Self { storage }
    }

    pub fn exists(&self, user_id: &str) -> bool {
        is_valid_document_id(user_id) && self.storage.exists(self.storage.paths().user(user_id))
    }

    /// Get a user by ID.
    pub fn get(&self, user_id: &str) -> StorageResult<StoredUser> {
        if !self.exists(user_id) {
            return Err(StorageError::NotFound(format!("User {user_id}")));
        }
        self.storage.read_json(self.storage.paths().user(user_id))
    }

    /// Look a user up by email. The email is normalized first.
    pub fn find_by_email(&self, email: &str) -> StorageResult<Option<StoredUser>> {
        let email = super::super::validation::normalize_email(email);
        Ok(self.list_all()?.into_iter().find(|user| user.email == email))
    }

    /// Find the user holding an unexpired reset token with this digest.
    pub fn find_by_reset_digest(
        &self,
        digest: &str,
        now: DateTime<Utc>,
    ) -> StorageResult<Option<StoredUser>> {
        Ok(self.list_all()?.into_iter().find(|user| {
            user.password_reset_token.as_deref() == Some(digest)
                && user.password_reset_expires.is_some_and(|expires| expires > now)
        }))
    }

    /// Validate and store a new user. Email must be unique.
    pub fn create(&self, mut user: StoredUser) -> StorageResult<StoredUser> {
        validate_user(&mut user)?;

        if self.exists(&user.id) {
            return Err(StorageError::AlreadyExists(format!("User {}", user.id)));
        }
        self.ensure_email_free(&user.email, &user.id)?;

        self.storage
            .write_json(self.storage.paths().user(&user.id), &user)?;
        tracing::info!(user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    /// Validate and replace an existing user document.
    pub fn update(&self, mut user: StoredUser) -> StorageResult<StoredUser> {
        validate_user(&mut user)?;

        if !self.exists(&user.id) {
            return Err(StorageError::NotFound(format!("User {}", user.id)));
        }
        self.ensure_email_free(&user.email, &user.id)?;

        user.updated_at = Utc::now();
        self.storage
            .write_json(self.storage.paths().user(&user.id), &user)?;
        Ok(user)
    }

    pub fn delete(&self, user_id: &str) -> StorageResult<()> {
        if !self.exists(user_id) {
            return Err(StorageError::NotFound(format!("User {user_id}")));
        }
        self.storage.delete(self.storage.paths().user(user_id))
    }

    /// All users, newest first.
    pub fn list_all(&self) -> StorageResult<Vec<StoredUser>> {
        let mut users: Vec<StoredUser> = self.storage.load_all(self.storage.paths().users_dir())?;
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    /// Number of users per role. Roles with no users are omitted.
    pub fn count_by_role(&self) -> StorageResult<BTreeMap<Role, usize>> {
        let mut counts = BTreeMap::new();
        for user in self.list_all()? {
            *counts.entry(user.role).or_insert(0) += 1;
        }
        Ok(counts)
    }

    fn ensure_email_free(&self, email: &str, own_id: &str) -> StorageResult<()> {
        let taken = self
            .list_all()?
            .iter()
            .any(|other| other.email == email && other.id != own_id);
        if taken {
            return Err(StorageError::AlreadyExists(format!("User with email {email}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use chrono::Duration;
    use tempfile::TempDir;

    fn test_storage() -> (DocumentStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut storage = DocumentStore::new(StoragePaths::new(temp_dir.path()));
        storage.initialize().expect("Failed to initialize");
        (storage, temp_dir)
    }

    fn test_user(email: &str) -> StoredUser {
        StoredUser::new("Asha Rai", email, "$argon2id$fake".to_string())
    }

    #[test]
    fn create_normalizes_and_get_returns_it() {
        let (storage, _temp_dir) = test_storage();
        let repo = UserRepository::new(&storage);

        let created = repo.create(test_user("  Asha@Example.com ")).unwrap();
        assert_eq!(created.email, "asha@example.com");

        let loaded = repo.get(&created.id).unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.role, Role::Reader);
        assert_eq!(loaded.profile_image, DEFAULT_PROFILE_IMAGE);
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let (storage, _temp_dir) = test_storage();
        let repo = UserRepository::new(&storage);

        repo.create(test_user("asha@example.com")).unwrap();
        let result = repo.create(test_user("ASHA@example.com"));
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
    }

    #[test]
    fn update_may_keep_own_email() {
        let (storage, _temp_dir) = test_storage();
        let repo = UserRepository::new(&storage);

        let mut user = repo.create(test_user("asha@example.com")).unwrap();
        user.bio = "Reporter".to_string();
        let updated = repo.update(user).unwrap();
        assert_eq!(updated.bio, "Reporter");
    }

    #[test]
    fn invalid_fields_are_rejected() {
        let (storage, _temp_dir) = test_storage();
        let repo = UserRepository::new(&storage);

        let mut user = test_user("asha@example.com");
        user.name = "x".repeat(USER_NAME_MAX + 1);
        assert!(matches!(repo.create(user), Err(StorageError::Validation(_))));

        assert!(matches!(
            repo.create(test_user("not-an-email")),
            Err(StorageError::Validation(_))
        ));
    }

    #[test]
    fn find_by_email_and_reset_digest() {
        let (storage, _temp_dir) = test_storage();
        let repo = UserRepository::new(&storage);
        let now = Utc::now();

        let mut user = test_user("asha@example.com");
        user.password_reset_token = Some("digest-1".to_string());
        user.password_reset_expires = Some(now + Duration::minutes(10));
        let user = repo.create(user).unwrap();

        assert_eq!(
            repo.find_by_email("Asha@Example.com").unwrap().map(|u| u.id),
            Some(user.id.clone())
        );
        assert!(repo.find_by_email("nobody@example.com").unwrap().is_none());

        assert!(repo.find_by_reset_digest("digest-1", now).unwrap().is_some());
        assert!(repo.find_by_reset_digest("digest-2", now).unwrap().is_none());
        assert!(repo
            .find_by_reset_digest("digest-1", now + Duration::minutes(11))
            .unwrap()
            .is_none());
    }

    #[test]
    fn count_by_role_groups_users() {
        let (storage, _temp_dir) = test_storage();
        let repo = UserRepository::new(&storage);

        repo.create(test_user("a@example.com")).unwrap();
        repo.create(test_user("b@example.com")).unwrap();
        let mut admin = test_user("c@example.com");
        admin.role = Role::Admin;
        repo.create(admin).unwrap();

        let counts = repo.count_by_role().unwrap();
        assert_eq!(counts.get(&Role::Reader), Some(&2));
        assert_eq!(counts.get(&Role::Admin), Some(&1));
        assert_eq!(counts.get(&Role::Editor), None);
    }

    #[test]
    fn profile_hides_secrets() {
        let mut user = test_user("asha@example.com");
        user.password_reset_token = Some("digest".to_string());
        let json = serde_json::to_value(UserProfile::from(user)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password_reset_token").is_none());
        assert_eq!(json["role"], "reader");
    }

    #[test]
    fn delete_and_path_like_ids() {
        let (storage, _temp_dir) = test_storage();
        let repo = UserRepository::new(&storage);

        let user = repo.create(test_user("asha@example.com")).unwrap();
        repo.delete(&user.id).unwrap();
        assert!(matches!(repo.get(&user.id), Err(StorageError::NotFound(_))));
        assert!(matches!(repo.get("../secrets"), Err(StorageError::NotFound(_))));
    }
}
