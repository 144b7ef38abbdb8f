// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Covers the two failure families of the verification path: acquiring the
//! signing key, and validating the token itself.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Authentication error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Public key file could not be read
    #[error("Failed to read public key: {0}")]
    KeyRead(String),
    /// Key endpoint could not be reached or answered with an error status
    #[error("Failed to fetch public key: {0}")]
    KeyFetch(String),
    /// Key endpoint returned something that is not JSON
    #[error("Malformed key document: {0}")]
    MalformedKeyDocument(String),
    /// Expected field is absent from the key document
    #[error("public key not found: {0}")]
    KeyNotFound(String),
    /// Key material is not a usable RSA public key
    #[error("Invalid public key: {0}")]
    InvalidKey(String),
    /// No bearer token was presented
    #[error("no bearer token found")]
    MissingToken,
    /// Token is malformed
    #[error("Token is malformed")]
    MalformedToken,
    /// Token is signed with a non-RSA algorithm
    #[error("unexpected signing method: {0}")]
    UnsupportedAlgorithm(String),
    /// Token signature is invalid
    #[error("Token signature is invalid")]
    InvalidSignature,
    /// Token has expired
    #[error("Token is expired")]
    TokenExpired,
    /// Token is not yet valid
    #[error("Token is not yet valid")]
    TokenNotYetValid,
    /// Token issuer is invalid
    #[error("Token issuer is invalid")]
    InvalidIssuer,
    /// Token audience is invalid
    #[error("Token audience is invalid")]
    InvalidAudience,
    /// Verified token lacks the claim used to identify the caller
    #[error("Token has no '{0}' claim")]
    MissingIdentityClaim(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::KeyRead(_) => "key_read_error",
            AuthError::KeyFetch(_) => "key_fetch_error",
            AuthError::MalformedKeyDocument(_) => "malformed_key_document",
            AuthError::KeyNotFound(_) => "key_not_found",
            AuthError::InvalidKey(_) => "invalid_key",
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedToken => "malformed_token",
            AuthError::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::MissingIdentityClaim(_) => "missing_identity_claim",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::MalformedToken
            | AuthError::UnsupportedAlgorithm(_)
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::TokenNotYetValid
            | AuthError::InvalidIssuer
            | AuthError::InvalidAudience => StatusCode::UNAUTHORIZED,
            AuthError::MissingIdentityClaim(_) => StatusCode::FORBIDDEN,
            AuthError::KeyRead(_)
            | AuthError::KeyFetch(_)
            | AuthError::MalformedKeyDocument(_)
            | AuthError::KeyNotFound(_)
            | AuthError::InvalidKey(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure happened while obtaining the signing key rather
    /// than while checking the token.
    pub fn is_key_error(&self) -> bool {
        matches!(
            self,
            AuthError::KeyRead(_)
                | AuthError::KeyFetch(_)
                | AuthError::MalformedKeyDocument(_)
                | AuthError::KeyNotFound(_)
                | AuthError::InvalidKey(_)
        )
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
