// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fixed four-role policy.
//!
//! | Request | Required role |
//! |---------|---------------|
//! | `GET`/`OPTIONS` | none |
//! | `GET`/`OPTIONS` under `/_admin` | `admin` |
//! | `POST`/`PUT`/`DELETE` | `editor` |
//! | `POST`/`PUT`/`DELETE` under `/_admin` | `admin` |
//! | anything else | denied |
//!
//! Roles are checked exactly; `admin` does not imply `editor`.

use axum::http::Method;
use tracing::debug;

use super::{is_admin_path, is_public_path, AuthorizationPolicy, ClaimRoleResolver, Decision};
use crate::auth::claims::Claims;
use crate::users::Role;

#[derive(Debug, Clone)]
pub struct SimplePolicy {
    resolver: ClaimRoleResolver,
    require_viewer_for_reads: bool,
}

impl SimplePolicy {
    pub fn new(resolver: ClaimRoleResolver) -> Self {
        Self {
            resolver,
            require_viewer_for_reads: false,
        }
    }

    /// Require `viewer` for reads outside `/public`.
    pub fn require_viewer_for_reads(mut self, enabled: bool) -> Self {
        self.require_viewer_for_reads = enabled;
        self
    }

    fn required_role(&self, method: &Method, path: &str) -> Option<Option<Role>> {
        let admin = is_admin_path(path);
        match *method {
            Method::GET | Method::OPTIONS => Some(if admin {
                Some(Role::Admin)
            } else if self.require_viewer_for_reads && !is_public_path(path) {
                Some(Role::Viewer)
            } else {
                None
            }),
            Method::POST | Method::PUT | Method::DELETE => {
                Some(Some(if admin { Role::Admin } else { Role::Editor }))
            }
            _ => None,
        }
    }
}

impl AuthorizationPolicy for SimplePolicy {
    fn decide(&self, claims: Option<&Claims>, method: &Method, path: &str) -> Decision {
        let decision = match self.required_role(method, path) {
            None => Decision::Deny,
            Some(None) => Decision::Allow,
            Some(Some(role)) => self.resolver.has_role(claims, &role).into(),
        };
        debug!(
            method = %method,
            path = %path,
            user = ?self.resolver.identity(claims),
            ?decision,
            "Simple policy decision"
        );
        decision
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::users::UserDirectory;

    const USER: &str = "jane.doe@example.com";

    fn setup(roles: &[Role]) -> (Arc<UserDirectory>, SimplePolicy, Claims) {
        let users = Arc::new(UserDirectory::new());
        users.add_user(USER, roles.iter().cloned());
        let policy = SimplePolicy::new(ClaimRoleResolver::new(users.clone()));
        let claims = serde_json::from_value(json!({ "email": USER })).unwrap();
        (users, policy, claims)
    }

    #[test]
    fn public_reads_need_no_role() {
        let (_, policy, claims) = setup(&[]);
        assert_eq!(policy.decide(Some(&claims), &Method::GET, "/public"), Decision::Allow);
        assert_eq!(policy.decide(None, &Method::GET, "/public"), Decision::Allow);
        assert_eq!(policy.decide(None, &Method::OPTIONS, "/data"), Decision::Allow);
    }

    #[test]
    fn admin_prefix_requires_admin() {
        let (users, policy, claims) = setup(&[]);
        assert_eq!(policy.decide(Some(&claims), &Method::GET, "/_admin"), Decision::Deny);

        users.assign_roles_to_user(USER, [Role::Viewer]).unwrap();
        assert_eq!(policy.decide(Some(&claims), &Method::GET, "/_admin"), Decision::Deny);

        users.assign_roles_to_user(USER, [Role::Admin]).unwrap();
        assert_eq!(policy.decide(Some(&claims), &Method::GET, "/_admin"), Decision::Allow);
        assert_eq!(
            policy.decide(Some(&claims), &Method::POST, "/_admin/reload"),
            Decision::Allow
        );
    }

    #[test]
    fn writes_require_editor() {
        let (users, policy, claims) = setup(&[]);
        assert_eq!(policy.decide(Some(&claims), &Method::POST, "/test"), Decision::Deny);

        users.assign_roles_to_user(USER, [Role::Viewer]).unwrap();
        assert_eq!(policy.decide(Some(&claims), &Method::PUT, "/test"), Decision::Deny);

        users.assign_roles_to_user(USER, [Role::Editor]).unwrap();
        assert_eq!(policy.decide(Some(&claims), &Method::DELETE, "/test"), Decision::Allow);

        users
            .remove_roles_from_user(USER, [Role::Editor, Role::Viewer])
            .unwrap();
        assert_eq!(policy.decide(Some(&claims), &Method::POST, "/test"), Decision::Deny);
    }

    #[test]
    fn admin_does_not_imply_editor() {
        let (_, policy, claims) = setup(&[Role::Admin]);
        assert_eq!(policy.decide(Some(&claims), &Method::POST, "/test"), Decision::Deny);
    }

    #[test]
    fn other_methods_are_denied() {
        let (_, policy, claims) = setup(&[Role::Admin, Role::Editor]);
        assert_eq!(policy.decide(Some(&claims), &Method::PATCH, "/test"), Decision::Deny);
        assert_eq!(policy.decide(Some(&claims), &Method::HEAD, "/public"), Decision::Deny);
    }

    #[test]
    fn viewer_required_for_private_reads_when_enabled() {
        let (users, policy, claims) = setup(&[]);
        let policy = policy.require_viewer_for_reads(true);

        assert_eq!(policy.decide(Some(&claims), &Method::GET, "/data"), Decision::Deny);
        assert_eq!(
            policy.decide(Some(&claims), &Method::GET, "/public/health"),
            Decision::Allow
        );

        users.assign_roles_to_user(USER, [Role::Viewer]).unwrap();
        assert_eq!(policy.decide(Some(&claims), &Method::GET, "/data"), Decision::Allow);
    }
}
