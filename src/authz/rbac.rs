// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role-graph policy.
//!
//! Reads under `/public` are always allowed. Every other read is turned into
//! an action string and allowed if any of the caller's roles is granted it.
//! Writes are denied unless `check_writes` is enabled.

use std::sync::Arc;

use axum::http::Method;
use tracing::debug;

use super::{action_string, is_public_path, AuthorizationPolicy, ClaimRoleResolver, Decision};
use crate::auth::claims::Claims;
use crate::rbac::RoleGraph;

#[derive(Debug, Clone)]
pub struct RbacPolicy {
    resolver: ClaimRoleResolver,
    graph: Arc<RoleGraph>,
    check_writes: bool,
}

impl RbacPolicy {
    pub fn new(resolver: ClaimRoleResolver, graph: Arc<RoleGraph>) -> Self {
        Self {
            resolver,
            graph,
            check_writes: false,
        }
    }

    /// Run `POST`/`PUT`/`DELETE`/`PATCH` through the graph instead of
    /// denying them.
    pub fn check_writes(mut self, enabled: bool) -> Self {
        self.check_writes = enabled;
        self
    }

    pub fn graph(&self) -> &Arc<RoleGraph> {
        &self.graph
    }

    fn granted(&self, claims: Option<&Claims>, method: &Method, path: &str) -> bool {
        let action = action_string(method, path);
        let roles = self.resolver.roles(claims);
        let granted = self.graph.is_permitted(&roles, &action);
        debug!(
            action = %action,
            user = ?self.resolver.identity(claims),
            roles = ?roles,
            granted,
            "RBAC lookup"
        );
        granted
    }
}

impl AuthorizationPolicy for RbacPolicy {
    fn decide(&self, claims: Option<&Claims>, method: &Method, path: &str) -> Decision {
        match *method {
            Method::GET | Method::OPTIONS => {
                if is_public_path(path) {
                    Decision::Allow
                } else {
                    self.granted(claims, method, path).into()
                }
            }
            Method::POST | Method::PUT | Method::DELETE | Method::PATCH if self.check_writes => {
                self.granted(claims, method, path).into()
            }
            _ => Decision::Deny,
        }
    }
}
