// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::{Claims, OptionalIdentity};
use crate::state::AppState;

/// Caller as seen by the server.
#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub authenticated: bool,
    /// Value of the identity claim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    /// Roles from the user directory, sorted.
    pub roles: Vec<String>,
    /// Expiry of the presented token (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<Claims>,
}

pub async fn whoami(
    OptionalIdentity(claims): OptionalIdentity,
    State(state): State<AppState>,
) -> Json<WhoAmIResponse> {
    let identity = claims
        .as_ref()
        .and_then(|claims| claims.identity(&state.settings.identity_claim))
        .map(str::to_string);

    let roles = identity
        .as_deref()
        .map(|user| state.users.roles_for(user))
        .unwrap_or_default()
        .into_iter()
        .map(String::from)
        .collect();

    Json(WhoAmIResponse {
        authenticated: claims.is_some(),
        identity,
        roles,
        expires_at: claims
            .as_ref()
            .and_then(Claims::expires_at)
            .map(|at| at.to_rfc3339()),
        claims,
    })
}
