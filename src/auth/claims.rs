// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims decoded from a verified token.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default claim used to look callers up in the user directory.
pub const DEFAULT_IDENTITY_CLAIM: &str = "email";

/// Claim set of a verified token.
///
/// Kept as an open JSON object: identity providers (Keycloak in particular)
/// put a lot of provider-specific data in the payload and only a handful of
/// fields matter for authorization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Wrap an already-decoded claim object.
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    /// Raw claim value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// String claim value.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Identity of the caller according to the given claim.
    ///
    /// Empty strings count as absent.
    pub fn identity(&self, claim: &str) -> Option<&str> {
        self.get_str(claim).filter(|id| !id.is_empty())
    }

    /// Subject (`sub`) claim.
    pub fn subject(&self) -> Option<&str> {
        self.get_str("sub")
    }

    /// Expiration (`exp`) claim as a timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.0
            .get("exp")
            .and_then(Value::as_i64)
            .and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }

    /// Borrow the whole claim object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_claims() -> Claims {
        serde_json::from_value(json!({
            "sub": "a3b0198a-cbe9-4275-8ca1-c3602304c264",
            "email": "jane.doe@example.com",
            "exp": 1700003600,
            "realm_access": { "roles": ["offline_access"] }
        }))
        .unwrap()
    }

    #[test]
    fn identity_reads_configured_claim() {
        let claims = sample_claims();
        assert_eq!(claims.identity(DEFAULT_IDENTITY_CLAIM), Some("jane.doe@example.com"));
        assert_eq!(claims.identity("preferred_username"), None);
    }

    #[test]
    fn empty_identity_counts_as_absent() {
        let claims: Claims = serde_json::from_value(json!({ "email": "" })).unwrap();
        assert_eq!(claims.identity("email"), None);
    }

    #[test]
    fn non_string_identity_is_ignored() {
        let claims: Claims = serde_json::from_value(json!({ "email": 42 })).unwrap();
        assert_eq!(claims.identity("email"), None);
    }

    #[test]
    fn expires_at_converts_timestamp() {
        let claims = sample_claims();
        assert_eq!(claims.expires_at().map(|t| t.timestamp()), Some(1700003600));
        assert_eq!(claims.subject(), Some("a3b0198a-cbe9-4275-8ca1-c3602304c264"));
    }
}
