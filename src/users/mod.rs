// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # User Directory
//!
//! Maps a user identifier (the identity claim of the token, usually the
//! e-mail address) to the set of roles the user holds.
//!
//! The directory is shared between configuration loading and live request
//! handling, so every operation goes through a read/write lock.

pub mod file;
pub mod roles;

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

pub use file::{UserDictionary, UserRoles};
pub use roles::Role;

/// Directory lookup failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("no user found")]
    UserNotFound { user_id: String },
}

/// Roles assigned to one user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserProfile {
    roles: HashSet<Role>,
}

impl UserProfile {
    /// Profile holding only the anonymous role.
    pub fn new() -> Self {
        let mut profile = Self::default();
        profile.add_role(Role::Anonymous);
        profile
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    /// Add a role. Returns `false` if it was already held.
    pub fn add_role(&mut self, role: Role) -> bool {
        self.roles.insert(role)
    }

    /// Remove a role. Returns `false` if it was not held.
    pub fn remove_role(&mut self, role: &Role) -> bool {
        self.roles.remove(role)
    }

    /// Held roles, sorted by identifier.
    pub fn roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self.roles.iter().cloned().collect();
        roles.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        roles
    }
}

/// Thread-safe user → profile mapping.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: RwLock<HashMap<String, UserProfile>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or overwrite) a user holding `anonymous` plus the given roles.
    pub fn add_user(&self, user_id: impl Into<String>, roles: impl IntoIterator<Item = Role>) {
        let user_id = user_id.into();
        let mut profile = UserProfile::new();
        for role in roles {
            profile.add_role(role);
        }
        debug!(user_id = %user_id, roles = ?profile.roles(), "Adding user");
        self.users.write().insert(user_id, profile);
    }

    /// Snapshot of a user's profile.
    pub fn get_user(&self, user_id: &str) -> Result<UserProfile, DirectoryError> {
        self.users
            .read()
            .get(user_id)
            .cloned()
            .ok_or_else(|| not_found(user_id))
    }

    /// Check a role; unknown users hold no roles.
    pub fn has_role(&self, user_id: &str, role: &Role) -> bool {
        self.users
            .read()
            .get(user_id)
            .is_some_and(|profile| profile.has_role(role))
    }

    /// Roles of a user, empty for unknown users.
    pub fn roles_for(&self, user_id: &str) -> Vec<Role> {
        self.users
            .read()
            .get(user_id)
            .map(UserProfile::roles)
            .unwrap_or_default()
    }

    pub fn assign_roles_to_user(
        &self,
        user_id: &str,
        roles: impl IntoIterator<Item = Role>,
    ) -> Result<(), DirectoryError> {
        let mut users = self.users.write();
        let profile = users.get_mut(user_id).ok_or_else(|| not_found(user_id))?;
        for role in roles {
            profile.add_role(role);
        }
        Ok(())
    }

    pub fn remove_roles_from_user(
        &self,
        user_id: &str,
        roles: impl IntoIterator<Item = Role>,
    ) -> Result<(), DirectoryError> {
        let mut users = self.users.write();
        let profile = users.get_mut(user_id).ok_or_else(|| not_found(user_id))?;
        for role in roles {
            profile.remove_role(&role);
        }
        Ok(())
    }

    /// Delete a user. Returns `false` if the user did not exist.
    pub fn remove_user(&self, user_id: &str) -> bool {
        self.users.write().remove(user_id).is_some()
    }

    pub fn clear(&self) {
        self.users.write().clear();
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    /// Replace the whole directory in one step.
    pub(crate) fn replace(&self, users: HashMap<String, UserProfile>) {
        *self.users.write() = users;
    }

    /// Snapshot of all users, sorted by identifier.
    pub(crate) fn snapshot(&self) -> Vec<(String, UserProfile)> {
        let mut users: Vec<(String, UserProfile)> = self
            .users
            .read()
            .iter()
            .map(|(id, profile)| (id.clone(), profile.clone()))
            .collect();
        users.sort_by(|a, b| a.0.cmp(&b.0));
        users
    }
}

fn not_found(user_id: &str) -> DirectoryError {
    DirectoryError::UserNotFound {
        user_id: user_id.to_string(),
    }
}
