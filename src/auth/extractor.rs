// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for verified claims.
//!
//! Both read the claims stored by [`auth_middleware`](super::middleware::auth_middleware):
//!
//! ```rust,ignore
//! async fn whoami(Identity(claims): Identity) -> impl IntoResponse {
//!     Json(claims)
//! }
//! ```

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::claims::Claims;
use super::error::AuthError;

/// Claims of an authenticated caller. Rejects with [`AuthError::MissingToken`]
/// when the request carries none.
#[derive(Debug, Clone)]
pub struct Identity(pub Claims);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(Identity)
            .ok_or(AuthError::MissingToken)
    }
}

/// Claims of the caller, if any.
#[derive(Debug, Clone)]
pub struct OptionalIdentity(pub Option<Claims>);

impl<S> FromRequestParts<S> for OptionalIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalIdentity(parts.extensions.get::<Claims>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;
    use serde_json::json;

    use super::*;

    fn parts(claims: Option<Claims>) -> Parts {
        let mut request = Request::builder().uri("/whoami").body(()).unwrap();
        if let Some(claims) = claims {
            request.extensions_mut().insert(claims);
        }
        request.into_parts().0
    }

    #[tokio::test]
    async fn identity_requires_claims() {
        let mut empty = parts(None);
        let rejection = Identity::from_request_parts(&mut empty, &()).await.unwrap_err();
        assert_eq!(rejection, AuthError::MissingToken);

        let claims: Claims = serde_json::from_value(json!({ "email": "jane@example.com" })).unwrap();
        let mut parts = parts(Some(claims));
        let Identity(found) = Identity::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found.identity("email"), Some("jane@example.com"));
    }

    #[tokio::test]
    async fn optional_identity_never_rejects() {
        let mut empty = parts(None);
        let OptionalIdentity(found) = OptionalIdentity::from_request_parts(&mut empty, &())
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
