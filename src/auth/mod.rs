// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer token verification for Axum services.
//!
//! ## Auth Flow
//!
//! 1. The identity provider (e.g. Keycloak) issues an RSA-signed JWT
//! 2. The client sends `Authorization: Bearer <JWT>`
//! 3. The middleware:
//!    - Obtains the provider's public key (PEM file or JWKS-like endpoint)
//!    - Verifies signature, algorithm family, expiry and `nbf`
//!    - Extracts the identity claim (`email` by default)
//!    - Hands claims, method and path to the authorization policy
//!
//! ## Security
//!
//! - Only RS256/384/512 and PS256/384/512 tokens are accepted
//! - Key endpoints must be http(s); fetches are bounded by a timeout
//! - The public key is fetched once and cached
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;
pub mod keys;
pub mod middleware;
pub mod verifier;

pub use claims::Claims;
pub use error::AuthError;
pub use extractor::{Identity, OptionalIdentity};
pub use keys::{
    Adapter, FileKeyProvider, JwksKeyProvider, PemKey, PublicKeyProvider, StaticKeyProvider,
    X5cAdapter,
};
pub use middleware::{auth_middleware, ignore_errors, reject_on_error, AuthGuard, ErrorHandler};
pub use verifier::TokenVerifier;
