// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification.

use std::sync::Arc;

use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use tracing::debug;

use super::claims::Claims;
use super::error::AuthError;
use super::keys::PublicKeyProvider;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Algorithms accepted for verification. Anything else, HMAC in particular,
/// is rejected before the key is used.
const RSA_ALGORITHMS: [Algorithm; 6] = [
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];

/// Verifies RSA-signed JWTs against the key of a [`PublicKeyProvider`].
#[derive(Clone)]
pub struct TokenVerifier {
    provider: Arc<dyn PublicKeyProvider>,
    /// Expected issuer (optional)
    issuer: Option<String>,
    /// Expected audience (optional)
    audience: Option<String>,
    leeway: u64,
}

impl TokenVerifier {
    /// Create a verifier using the given key source.
    pub fn new(provider: Arc<dyn PublicKeyProvider>) -> Self {
        Self {
            provider,
            issuer: None,
            audience: None,
            leeway: CLOCK_SKEW_LEEWAY,
        }
    }

    /// Create a verifier owning the given key source.
    pub fn from_provider(provider: impl PublicKeyProvider + 'static) -> Self {
        Self::new(Arc::new(provider))
    }

    /// Require the `iss` claim to match.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Require the `aud` claim to contain the given audience.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Override the clock skew tolerance, in seconds.
    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    /// Verify the token and return its claims.
    pub async fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let pem = self.provider.get().await?;
        let decoding_key =
            DecodingKey::from_rsa_pem(&pem).map_err(|e| AuthError::InvalidKey(e.to_string()))?;

        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        if !RSA_ALGORITHMS.contains(&header.alg) {
            return Err(AuthError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        let token_data = decode::<Claims>(token, &decoding_key, &self.validation())
            .map_err(|e| {
                let err = map_jwt_error(e.kind());
                debug!(error = %err, "Token rejected");
                err
            })?;

        Ok(token_data.claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.algorithms = RSA_ALGORITHMS.to_vec();
        validation.leeway = self.leeway;
        validation.validate_nbf = true;
        // exp and nbf are checked only when present
        validation.required_spec_claims.clear();

        if let Some(ref issuer) = self.issuer {
            validation.set_issuer(&[issuer]);
            validation.required_spec_claims.insert("iss".to_string());
        }

        if let Some(ref audience) = self.audience {
            validation.set_audience(&[audience]);
            validation.required_spec_claims.insert("aud".to_string());
        } else {
            validation.validate_aud = false;
        }

        validation
    }
}

fn map_jwt_error(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
        ErrorKind::InvalidAudience => AuthError::InvalidAudience,
        ErrorKind::MissingRequiredClaim(claim) if claim == "iss" => AuthError::InvalidIssuer,
        ErrorKind::MissingRequiredClaim(claim) if claim == "aud" => AuthError::InvalidAudience,
        ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
        ErrorKind::InvalidAlgorithm => {
            AuthError::UnsupportedAlgorithm("algorithm does not match key".to_string())
        }
        ErrorKind::InvalidKeyFormat => AuthError::InvalidKey("unrecognized key format".to_string()),
        _ => AuthError::MalformedToken,
    }
}
