// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Owner-or-override checks for mutating operations.
//!
//! A mutation is permitted when the requester owns the document, or when the
//! requester's role is in the override set for the (collection, action)
//! pair. The check runs after the document has been loaded, so a missing
//! document surfaces as not found before ownership is considered.

use std::fmt;

use crate::auth::{Identity, Role};

/// Documents with a recorded owner.
pub trait OwnedResource {
    /// Owner's user ID. Set at creation and never reassigned.
    fn owner_user_id(&self) -> &str;

    /// Collection name used in denial messages.
    fn resource_kind(&self) -> &'static str;

    fn resource_id(&self) -> &str;
}

/// Mutating action subject to ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Update,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
        }
    }
}

/// Per-collection override roles.
#[derive(Debug, Clone, Copy)]
pub struct OwnershipPolicy {
    pub update_override: &'static [Role],
    pub delete_override: &'static [Role],
}

impl OwnershipPolicy {
    /// Editors may revise any article but only admins may remove one.
    pub const NEWS: Self = Self {
        update_override: &[Role::Editor, Role::Admin],
        delete_override: &[Role::Admin],
    };

    pub const ADVERTISEMENTS: Self = Self {
        update_override: &[Role::Admin],
        delete_override: &[Role::Admin],
    };

    /// The owner of a user document is the user itself.
    pub const USERS: Self = Self {
        update_override: &[Role::Admin],
        delete_override: &[Role::Admin],
    };

    pub fn overrides(&self, action: Action) -> &'static [Role] {
        match action {
            Action::Update => self.update_override,
            Action::Delete => self.delete_override,
        }
    }

    /// Pure decision over owner id and requester.
    pub fn permits(&self, owner_id: &str, requester: &Identity, action: Action) -> bool {
        requester.id == owner_id || requester.role.is_in(self.overrides(action))
    }
}

/// Denial carrying the action and the document it targeted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Not authorized to {action} {kind} {id}")]
pub struct OwnershipDenied {
    pub action: Action,
    pub kind: &'static str,
    pub id: String,
}

/// Check `requester` against `resource` under `policy`.
pub fn enforce<R: OwnedResource>(
    policy: &OwnershipPolicy,
    resource: &R,
    requester: &Identity,
    action: Action,
) -> Result<(), OwnershipDenied> {
    if policy.permits(resource.owner_user_id(), requester, action) {
        return Ok(());
    }

    tracing::warn!(
        user_id = %requester.id,
        role = %requester.role,
        resource = resource.resource_kind(),
        resource_id = resource.resource_id(),
        %action,
        "ownership check failed"
    );
    Err(OwnershipDenied {
        action,
        kind: resource.resource_kind(),
        id: resource.resource_id().to_string(),
    })
}
