// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! End-to-end request scenarios through the authentication middleware.

mod common;

use std::sync::Arc;

use axum::{
    http::{HeaderMap, HeaderName, Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde_json::json;

use common::{expired_token_for, send, sign, token_for, verifier, now, USER};
use rolegate::{
    auth::{auth_middleware, ignore_errors, AuthError, AuthGuard, Identity},
    authz::{ClaimRoleResolver, RbacPolicy, SimplePolicy},
    rbac::RoleGraph,
    users::{Role, UserDirectory},
};

const IDENTITY: HeaderName = HeaderName::from_static("x-authenticated-user");

async fn ok() -> &'static str {
    "ok"
}

async fn echo_identity(headers: HeaderMap) -> String {
    headers
        .get(&IDENTITY)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("<none>")
        .to_string()
}

async fn whoami(Identity(claims): Identity) -> String {
    claims.identity("email").unwrap_or_default().to_string()
}

fn app(guard: AuthGuard) -> Router {
    Router::new()
        .route("/public", get(ok))
        .route("/data/tags", get(ok))
        .route("/_admin", get(ok))
        .route("/test", post(ok))
        .route("/identity", get(echo_identity))
        .route("/whoami", get(whoami))
        .layer(middleware::from_fn_with_state(guard, auth_middleware))
}

fn simple_app(users: &Arc<UserDirectory>) -> Router {
    let policy = SimplePolicy::new(ClaimRoleResolver::new(Arc::clone(users)));
    app(AuthGuard::new(verifier()).with_policy(policy))
}

fn directory() -> Arc<UserDirectory> {
    let users = Arc::new(UserDirectory::new());
    users.add_user(USER, []);
    users
}

#[tokio::test]
async fn simple_public_prefix_needs_no_role() {
    let users = directory();
    let app = simple_app(&users);

    let (status, body) = send(&app, Method::GET, "/public", Some(&token_for(USER))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn simple_admin_prefix_requires_admin() {
    let users = directory();
    let app = simple_app(&users);
    let token = token_for(USER);

    let (status, body) = send(&app, Method::GET, "/_admin", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Unauthorized request GET /_admin");

    users.assign_roles_to_user(USER, [Role::Viewer]).unwrap();
    let (status, _) = send(&app, Method::GET, "/_admin", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    users.assign_roles_to_user(USER, [Role::Admin]).unwrap();
    let (status, _) = send(&app, Method::GET, "/_admin", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn simple_write_requires_editor() {
    let users = directory();
    let app = simple_app(&users);
    let token = token_for(USER);

    let (status, _) = send(&app, Method::POST, "/test", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    users.assign_roles_to_user(USER, [Role::Viewer]).unwrap();
    let (status, _) = send(&app, Method::POST, "/test", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    users.assign_roles_to_user(USER, [Role::Editor]).unwrap();
    let (status, _) = send(&app, Method::POST, "/test", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    users
        .remove_roles_from_user(USER, [Role::Viewer, Role::Editor])
        .unwrap();
    let (status, body) = send(&app, Method::POST, "/test", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Unauthorized request POST /test");
}

#[tokio::test]
async fn rbac_grant_follows_user_roles() {
    let users = directory();
    users.assign_roles_to_user(USER, [Role::Viewer]).unwrap();

    let graph = Arc::new(RoleGraph::new());
    graph.add_role("viewer").unwrap();
    graph.assign_permission("viewer", "get::data:tags").unwrap();

    let policy = RbacPolicy::new(ClaimRoleResolver::new(Arc::clone(&users)), graph);
    let app = app(AuthGuard::new(verifier()).with_policy(policy));
    let token = token_for(USER);

    let (status, _) = send(&app, Method::GET, "/data/tags", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    users.remove_roles_from_user(USER, [Role::Viewer]).unwrap();
    let (status, body) = send(&app, Method::GET, "/data/tags", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Unauthorized request GET /data/tags");
}

#[tokio::test]
async fn denial_names_original_uri_when_nested() {
    let users = directory();
    let app = Router::new().nest("/api/v2", simple_app(&users));

    let (status, body) = send(&app, Method::GET, "/api/v2/_admin?page=2", Some(&token_for(USER))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Unauthorized request GET /api/v2/_admin?page=2");

    let (status, _) = send(&app, Method::GET, "/api/v2/public", Some(&token_for(USER))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn verification_failures_use_default_handler() {
    let users = directory();
    let app = simple_app(&users);

    let (status, body) = send(&app, Method::GET, "/public", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error_code"], "missing_token");

    let (status, body) = send(&app, Method::GET, "/public", Some(&expired_token_for(USER))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "Token is expired");
    assert_eq!(json["error_code"], "token_expired");
}

#[tokio::test]
async fn non_bearer_authorization_counts_as_missing_token() {
    let users = directory();
    let app = simple_app(&users);

    let request = axum::http::Request::get("/public")
        .header(axum::http::header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error_code"], "missing_token");
}

#[tokio::test]
async fn custom_error_handler_decides_status() {
    let users = directory();
    let policy = SimplePolicy::new(ClaimRoleResolver::new(Arc::clone(&users)));
    let guard = AuthGuard::new(verifier())
        .with_policy(policy)
        .with_error_handler(|err| match err {
            AuthError::TokenExpired => {
                Some((StatusCode::FORBIDDEN, err.to_string()).into_response())
            }
            _ => None,
        });
    let app = app(guard);

    let (status, body) = send(&app, Method::GET, "/public", Some(&expired_token_for(USER))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, "Token is expired");

    // ignored failures continue without claims
    let (status, _) = send(&app, Method::GET, "/public", Some("not-a-token")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn policy_denial_is_not_overridable() {
    let users = directory();
    let policy = SimplePolicy::new(ClaimRoleResolver::new(Arc::clone(&users)));
    let guard = AuthGuard::new(verifier())
        .with_policy(policy)
        .with_error_handler(|_| None);
    let app = app(guard);

    let (status, body) = send(&app, Method::POST, "/test", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Unauthorized request POST /test");
}

#[tokio::test]
async fn identity_is_forwarded_in_header() {
    let users = directory();
    let policy = SimplePolicy::new(ClaimRoleResolver::new(Arc::clone(&users)));
    let guard = AuthGuard::new(verifier())
        .with_policy(policy)
        .with_shared_error_handler(ignore_errors())
        .forward_identity(IDENTITY);
    let app = app(guard);

    let (status, body) = send(&app, Method::GET, "/identity", Some(&token_for(USER))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, USER);

    let (_, body) = send(&app, Method::GET, "/identity", None).await;
    assert_eq!(body, "anonymous");
}

#[tokio::test]
async fn client_supplied_identity_header_is_discarded() {
    let guard = AuthGuard::new(verifier()).forward_identity(IDENTITY);
    let app = app(guard);

    let request = axum::http::Request::get("/identity")
        .header(&IDENTITY, "admin@example.com")
        .header(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {}", token_for(USER)),
        )
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], USER.as_bytes());
}

#[tokio::test]
async fn missing_identity_claim_is_forbidden() {
    let users = directory();
    let app = simple_app(&users);
    let token = sign(&json!({ "sub": "service-account", "exp": now() + 3600 }));

    let (status, body) = send(&app, Method::GET, "/public", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error_code"], "missing_identity_claim");
}

#[tokio::test]
async fn claims_reach_the_handler() {
    let app = app(AuthGuard::new(verifier()));

    let (status, body) = send(&app, Method::GET, "/whoami", Some(&token_for(USER))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, USER);
}

#[tokio::test]
async fn disabled_guard_passes_everything() {
    let app = app(AuthGuard::disabled());

    let (status, _) = send(&app, Method::POST, "/test", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/whoami", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
