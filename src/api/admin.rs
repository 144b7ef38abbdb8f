// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin endpoints.
//!
//! Access is enforced by the authorization policy (`/_admin` prefix), not by
//! the handlers themselves.

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::{
    error::ApiError,
    rbac::RbacDocument,
    state::{AppState, LoadSummary},
    users::{UserDictionary, UserRoles},
};

/// Current user dictionary.
pub async fn list_users(State(state): State<AppState>) -> Json<UserDictionary> {
    Json(state.users.to_dictionary())
}

/// Roles of a single user.
pub async fn get_user(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<UserRoles>, ApiError> {
    let profile = state.users.get_user(&user)?;
    Ok(Json(UserRoles {
        roles: profile.roles().into_iter().map(String::from).collect(),
        user,
    }))
}

/// Current role graph.
pub async fn rbac_document(State(state): State<AppState>) -> Json<RbacDocument> {
    Json(state.graph.to_document())
}

/// Reload the user dictionary and role graph from disk.
pub async fn reload(State(state): State<AppState>) -> Result<Json<LoadSummary>, ApiError> {
    info!("Reloading configuration");
    let summary = tokio::task::spawn_blocking(move || state.reload())
        .await
        .map_err(|e| ApiError::internal(format!("reload task failed: {e}")))??;
    Ok(Json(summary))
}
