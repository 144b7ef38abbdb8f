// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authorization
//!
//! Turns an HTTP method, a path and the caller's verified claims into an
//! allow/deny decision.
//!
//! Two policies are provided:
//!
//! - [`SimplePolicy`] - fixed four-role model (`viewer`, `editor`, `admin`)
//! - [`RbacPolicy`] - permission lookup in a [`RoleGraph`](crate::rbac::RoleGraph)
//!
//! Both resolve the caller's roles through a [`ClaimRoleResolver`], which
//! keys the [`UserDirectory`] by the identity claim of the token.

pub mod rbac;
pub mod simple;

use std::sync::Arc;

use axum::{
    http::{header::CONTENT_TYPE, Method, StatusCode},
    response::{IntoResponse, Response},
};

use crate::auth::claims::{Claims, DEFAULT_IDENTITY_CLAIM};
use crate::users::{Role, UserDirectory};

pub use rbac::RbacPolicy;
pub use simple::SimplePolicy;

/// Path prefix readable without any role.
pub const PUBLIC_PREFIX: &str = "/public";

/// Path prefix reserved for administrators.
pub const ADMIN_PREFIX: &str = "/_admin";

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

/// Per-request authorization decision.
///
/// `claims` is `None` for anonymous callers and when verification failed but
/// the error handler let the request continue.
pub trait AuthorizationPolicy: Send + Sync {
    fn decide(&self, claims: Option<&Claims>, method: &Method, path: &str) -> Decision;
}

/// Canonical action string of a request: `GET /data/tags` is `get::data:tags`.
pub fn action_string(method: &Method, path: &str) -> String {
    format!("{}:{}", method.as_str(), path.replace('/', ":")).to_lowercase()
}

/// Whether the path is `/public` or below it.
pub fn is_public_path(path: &str) -> bool {
    path.strip_prefix(PUBLIC_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Whether the path starts with `/_admin`.
pub fn is_admin_path(path: &str) -> bool {
    path.starts_with(ADMIN_PREFIX)
}

/// Looks up the caller's roles in a [`UserDirectory`].
#[derive(Debug, Clone)]
pub struct ClaimRoleResolver {
    users: Arc<UserDirectory>,
    identity_claim: String,
}

impl ClaimRoleResolver {
    pub fn new(users: Arc<UserDirectory>) -> Self {
        Self {
            users,
            identity_claim: DEFAULT_IDENTITY_CLAIM.to_string(),
        }
    }

    pub fn with_identity_claim(mut self, claim: impl Into<String>) -> Self {
        self.identity_claim = claim.into();
        self
    }

    pub fn users(&self) -> &Arc<UserDirectory> {
        &self.users
    }

    pub fn identity_claim(&self) -> &str {
        &self.identity_claim
    }

    /// Identity of the caller, if the claims carry one.
    pub fn identity<'a>(&self, claims: Option<&'a Claims>) -> Option<&'a str> {
        claims.and_then(|claims| claims.identity(&self.identity_claim))
    }

    pub fn has_role(&self, claims: Option<&Claims>, role: &Role) -> bool {
        self.identity(claims)
            .is_some_and(|user| self.users.has_role(user, role))
    }

    /// Roles of the caller. Callers without an identity, or unknown to the
    /// directory, hold only `anonymous`.
    pub fn roles(&self, claims: Option<&Claims>) -> Vec<Role> {
        let roles = self
            .identity(claims)
            .map(|user| self.users.roles_for(user))
            .unwrap_or_default();
        if roles.is_empty() {
            vec![Role::Anonymous]
        } else {
            roles
        }
    }
}

/// Policy rejection, rendered as a plain-text 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDenied {
    pub method: Method,
    pub uri: String,
}

impl AccessDenied {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
        }
    }
}

impl std::fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unauthorized request {} {}", self.method, self.uri)
    }
}

impl IntoResponse for AccessDenied {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}
