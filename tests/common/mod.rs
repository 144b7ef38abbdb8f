// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header::AUTHORIZATION, Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use rolegate::auth::{StaticKeyProvider, TokenVerifier};

pub const SIGNING_KEY: &str = include_str!("../fixtures/signing-key.pem");
pub const FOREIGN_KEY: &str = include_str!("../fixtures/foreign-key.pem");
pub const PUBLIC_KEY: &str = include_str!("../fixtures/signing-pk.pem");
pub const KEYCLOAK_CERTS: &str = include_str!("../fixtures/keycloak-certs.json");

pub const USER: &str = "jane.doe@example.com";

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn sign(claims: &Value) -> String {
    let key = EncodingKey::from_rsa_pem(SIGNING_KEY.as_bytes()).unwrap();
    encode(&Header::new(Algorithm::RS256), claims, &key).unwrap()
}

/// Valid token for the given e-mail, expiring in an hour.
pub fn token_for(email: &str) -> String {
    sign(&json!({
        "sub": "f0e1d2c3",
        "email": email,
        "iat": now(),
        "exp": now() + 3600,
    }))
}

pub fn expired_token_for(email: &str) -> String {
    sign(&json!({
        "email": email,
        "iat": now() - 7200,
        "exp": now() - 3600,
    }))
}

/// Base64 body of the SPKI public key fixture, as served in an `x5c` field.
pub fn public_key_base64() -> String {
    PUBLIC_KEY
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect()
}

pub fn verifier() -> TokenVerifier {
    TokenVerifier::from_provider(StaticKeyProvider::new(PUBLIC_KEY))
}

/// Send one request and collect status and body.
pub async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>) -> (StatusCode, String) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let response = app
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}
