// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};

/// Role held by a user.
///
/// ## Well-known roles
///
/// - `Anonymous` - Every profile starts with it
/// - `Viewer` - Read access (simple model)
/// - `Editor` - Write access (simple model)
/// - `Admin` - Access to `/_admin` endpoints (simple model)
///
/// Any other identifier is a `Custom` role, meaningful only through the
/// RBAC role graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Anonymous,
    Viewer,
    Editor,
    Admin,
    Custom(String),
}

impl Role {
    /// Parse a role identifier, normalizing case and surrounding whitespace.
    pub fn parse(s: &str) -> Role {
        let id = normalize(s);
        Role::well_known(&id).unwrap_or(Role::Custom(id))
    }

    /// Parse one of the four well-known roles (case-insensitive).
    pub fn well_known(s: &str) -> Option<Role> {
        match normalize(s).as_str() {
            "anonymous" => Some(Role::Anonymous),
            "viewer" => Some(Role::Viewer),
            "editor" => Some(Role::Editor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// Role identifier as used in files and in the role graph.
    pub fn as_str(&self) -> &str {
        match self {
            Role::Anonymous => "anonymous",
            Role::Viewer => "viewer",
            Role::Editor => "editor",
            Role::Admin => "admin",
            Role::Custom(id) => id,
        }
    }
}

/// Normalize a role identifier (trimmed, lower-cased).
pub fn normalize(id: &str) -> String {
    id.trim().to_lowercase()
}

impl Default for Role {
    /// Default role is Anonymous (least privilege).
    fn default() -> Self {
        Role::Anonymous
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        Role::parse(&s)
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Role::parse(s)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Custom(id) => id,
            other => other.as_str().to_string(),
        }
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
