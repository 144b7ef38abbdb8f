// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{auth::auth_middleware, state::AppState};

pub mod admin;
pub mod health;
pub mod whoami;

pub fn router(state: AppState) -> Router {
    let guard = state.auth_guard();

    Router::new()
        .route("/public/health", get(health::health))
        .route("/whoami", get(whoami::whoami))
        .route("/_admin/users", get(admin::list_users))
        .route("/_admin/users/{user}", get(admin::get_user))
        .route("/_admin/rbac", get(admin::rbac_document))
        .route("/_admin/reload", post(admin::reload))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(guard, auth_middleware)),
        )
        .with_state(state)
}
