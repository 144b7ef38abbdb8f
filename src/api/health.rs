// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::Serialize;

use crate::config::PolicyKind;
use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Whether bearer tokens are verified.
    pub auth: bool,
    /// Active authorization policy (`simple`, `rbac` or `none`).
    pub policy: String,
    pub users: usize,
    pub roles: usize,
}

/// Liveness handler, always public.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let policy = match state.settings.policy {
        PolicyKind::Simple => "simple",
        PolicyKind::Rbac => "rbac",
        PolicyKind::None => "none",
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        auth: state.auth_enabled(),
        policy: policy.to_string(),
        users: state.users.len(),
        roles: state.graph.len(),
    })
}
