// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization middleware for Axum.
//!
//! ## Pipeline
//!
//! 1. No verifier configured: the request passes through untouched
//! 2. The bearer token is taken from `Authorization`; without one the caller
//!    is anonymous and verification reports [`AuthError::MissingToken`]
//! 3. Verification errors go to the error handler, which either answers the
//!    request or lets it continue without claims
//! 4. The policy decides on method and path; a denial is always a plain-text
//!    401 naming the original request URI
//! 5. Verified claims are stored in the request extensions for
//!    [`Identity`](super::extractor::Identity)
//!
//! ## Usage
//!
//! ```rust,ignore
//! let guard = AuthGuard::new(verifier).with_policy(policy);
//!
//! let app = Router::new()
//!     .route("/data/tags", get(list_tags))
//!     .layer(axum::middleware::from_fn_with_state(guard, auth_middleware));
//! ```

use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, info, warn};

use super::claims::{Claims, DEFAULT_IDENTITY_CLAIM};
use super::error::AuthError;
use super::verifier::TokenVerifier;
use crate::authz::{AccessDenied, AuthorizationPolicy};

/// Identity header value for callers without a bearer token.
pub const ANONYMOUS_IDENTITY: &str = "anonymous";

/// Decides what happens when verification fails.
///
/// Returning `Some(response)` answers the request; `None` lets it continue
/// without claims.
pub type ErrorHandler = Arc<dyn Fn(&AuthError) -> Option<Response> + Send + Sync>;

/// Answer every verification failure with the error's own status and JSON
/// body.
pub fn reject_on_error() -> ErrorHandler {
    Arc::new(|err: &AuthError| Some(err.clone().into_response()))
}

/// Let every request continue, leaving the decision to the policy.
pub fn ignore_errors() -> ErrorHandler {
    Arc::new(|err: &AuthError| {
        debug!(error = %err, "Ignoring authentication failure");
        None
    })
}

/// Middleware state.
#[derive(Clone)]
pub struct AuthGuard {
    verifier: Option<Arc<TokenVerifier>>,
    policy: Option<Arc<dyn AuthorizationPolicy>>,
    on_error: ErrorHandler,
    identity_claim: String,
    identity_header: Option<HeaderName>,
}

impl AuthGuard {
    /// Guard verifying tokens with the given verifier and no policy.
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            verifier: Some(Arc::new(verifier)),
            ..Self::disabled()
        }
    }

    /// Guard that lets every request through.
    pub fn disabled() -> Self {
        Self {
            verifier: None,
            policy: None,
            on_error: reject_on_error(),
            identity_claim: DEFAULT_IDENTITY_CLAIM.to_string(),
            identity_header: None,
        }
    }

    pub fn with_policy(self, policy: impl AuthorizationPolicy + 'static) -> Self {
        self.with_shared_policy(Arc::new(policy))
    }

    pub fn with_shared_policy(mut self, policy: Arc<dyn AuthorizationPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_error_handler<F>(self, handler: F) -> Self
    where
        F: Fn(&AuthError) -> Option<Response> + Send + Sync + 'static,
    {
        self.with_shared_error_handler(Arc::new(handler))
    }

    pub fn with_shared_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.on_error = handler;
        self
    }

    /// Claim identifying the caller (default `email`).
    pub fn with_identity_claim(mut self, claim: impl Into<String>) -> Self {
        self.identity_claim = claim.into();
        self
    }

    /// Forward the caller's identity to the handler in the given header.
    ///
    /// Any value sent by the client in that header is discarded.
    pub fn forward_identity(mut self, header: HeaderName) -> Self {
        self.identity_header = Some(header);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.verifier.is_some()
    }

    fn set_identity(&self, headers: &mut HeaderMap, identity: &str) {
        let Some(header) = &self.identity_header else {
            return;
        };
        match HeaderValue::from_str(identity) {
            Ok(value) => {
                headers.insert(header.clone(), value);
            }
            Err(_) => warn!(identity = %identity, "Identity is not a valid header value"),
        }
    }
}

/// Extract the token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let token = headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .trim();
    (!token.is_empty()).then_some(token)
}

/// Authentication middleware function.
pub async fn auth_middleware(
    State(guard): State<AuthGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(verifier) = guard.verifier.clone() else {
        return next.run(request).await;
    };

    if let Some(header) = &guard.identity_header {
        request.headers_mut().remove(header);
    }

    let token = match bearer_token(request.headers()) {
        Some(token) => token.to_string(),
        None => {
            guard.set_identity(request.headers_mut(), ANONYMOUS_IDENTITY);
            String::new()
        }
    };

    let claims = match verifier.validate(&token).await {
        Ok(claims) => match check_identity(&guard, claims, request.headers_mut()) {
            Ok(claims) => claims,
            Err(response) => return response,
        },
        Err(err) => {
            if err.is_key_error() {
                warn!(error = %err, "Public key unavailable");
            } else {
                debug!(error = %err, path = %request.uri().path(), "Token rejected");
            }
            if let Some(response) = (guard.on_error)(&err) {
                return response;
            }
            None
        }
    };

    if let Some(policy) = &guard.policy {
        let decision = policy.decide(claims.as_ref(), request.method(), request.uri().path());
        if !decision.is_allowed() {
            let uri = request
                .extensions()
                .get::<OriginalUri>()
                .map(|original| original.0.to_string())
                .unwrap_or_else(|| request.uri().to_string());
            info!(method = %request.method(), uri = %uri, "Request denied by policy");
            return AccessDenied::new(request.method().clone(), uri).into_response();
        }
    }

    if let Some(claims) = claims {
        request.extensions_mut().insert(claims);
    }
    next.run(request).await
}

/// Forward the identity of verified claims, routing a missing identity
/// through the error handler.
fn check_identity(
    guard: &AuthGuard,
    claims: Claims,
    headers: &mut HeaderMap,
) -> Result<Option<Claims>, Response> {
    match claims.identity(&guard.identity_claim) {
        Some(identity) => {
            guard.set_identity(headers, identity);
            Ok(Some(claims))
        }
        None => {
            let err = AuthError::MissingIdentityClaim(guard.identity_claim.clone());
            debug!(error = %err, "Verified token carries no identity");
            match (guard.on_error)(&err) {
                Some(response) => Err(response),
                None => Ok(Some(claims)),
            }
        }
    }
}
