// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared application state of the demo server.

use std::sync::Arc;

use axum::http::HeaderName;
use serde::Serialize;
use tracing::{info, warn};

use crate::auth::{
    AuthGuard, FileKeyProvider, JwksKeyProvider, PublicKeyProvider, TokenVerifier, X5cAdapter,
};
use crate::authz::{ClaimRoleResolver, RbacPolicy, SimplePolicy};
use crate::config::{KeySource, PolicyKind, Settings};
use crate::error::ConfigError;
use crate::rbac::{MatchMode, RoleGraph};
use crate::users::UserDirectory;

/// Header carrying the caller's identity to handlers.
pub const IDENTITY_HEADER: HeaderName = HeaderName::from_static("x-authenticated-user");

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub users: Arc<UserDirectory>,
    pub graph: Arc<RoleGraph>,
    /// `None` when authentication is disabled
    pub key_provider: Option<Arc<dyn PublicKeyProvider>>,
}

/// Counts reported after (re)loading configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub users: usize,
    pub roles: usize,
}

impl AppState {
    /// Build the state without touching configuration files.
    pub fn new(settings: Settings) -> Result<Self, ConfigError> {
        let key_provider: Option<Arc<dyn PublicKeyProvider>> = match &settings.key_source {
            None => None,
            Some(KeySource::File(path)) => Some(Arc::new(FileKeyProvider::new(path.clone()))),
            Some(KeySource::Jwks {
                url,
                field,
                timeout,
            }) => Some(Arc::new(
                JwksKeyProvider::new(url)?
                    .with_adapter(X5cAdapter::new(field.clone()))
                    .with_timeout(*timeout),
            )),
        };

        let mode = if settings.anchor_permissions {
            MatchMode::Anchored
        } else {
            MatchMode::Unanchored
        };

        Ok(Self {
            settings: Arc::new(settings),
            users: Arc::new(UserDirectory::new()),
            graph: Arc::new(RoleGraph::with_match_mode(mode)),
            key_provider,
        })
    }

    /// Build the state and load the configured files.
    pub fn load(settings: Settings) -> Result<Self, ConfigError> {
        let state = Self::new(settings)?;
        state.reload()?;
        Ok(state)
    }

    /// Reload the user dictionary and role graph from disk.
    ///
    /// A missing user dictionary leaves the directory empty. Each file is
    /// loaded atomically; a failure keeps that file's previous contents.
    pub fn reload(&self) -> Result<LoadSummary, ConfigError> {
        let dictionary = &self.settings.user_dictionary;
        if dictionary.exists() {
            self.users.load_from_file(dictionary)?;
        } else {
            warn!(path = %dictionary.display(), "User dictionary not found, starting empty");
        }

        if let Some(rbac) = &self.settings.rbac_config {
            self.graph.load_from_file(rbac)?;
        } else if self.settings.policy == PolicyKind::Rbac {
            warn!("RBAC policy selected without a role graph file; only public reads are allowed");
        }

        let summary = LoadSummary {
            users: self.users.len(),
            roles: self.graph.len(),
        };
        info!(users = summary.users, roles = summary.roles, "Configuration loaded");
        Ok(summary)
    }

    pub fn auth_enabled(&self) -> bool {
        self.key_provider.is_some()
    }

    /// Middleware state matching the settings.
    pub fn auth_guard(&self) -> AuthGuard {
        let Some(provider) = &self.key_provider else {
            warn!("No key source configured, authentication is disabled");
            return AuthGuard::disabled();
        };

        let mut verifier = TokenVerifier::new(Arc::clone(provider));
        if let Some(issuer) = &self.settings.issuer {
            verifier = verifier.with_issuer(issuer.clone());
        }
        if let Some(audience) = &self.settings.audience {
            verifier = verifier.with_audience(audience.clone());
        }

        let claim = self.settings.identity_claim.clone();
        let resolver = ClaimRoleResolver::new(Arc::clone(&self.users)).with_identity_claim(&claim);
        let guard = AuthGuard::new(verifier)
            .with_identity_claim(claim)
            .forward_identity(IDENTITY_HEADER);

        match self.settings.policy {
            PolicyKind::Simple => guard.with_policy(SimplePolicy::new(resolver)),
            PolicyKind::Rbac => guard.with_policy(RbacPolicy::new(resolver, Arc::clone(&self.graph))),
            PolicyKind::None => guard,
        }
    }
}
