// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Public key acquisition for token verification.
//!
//! ## Providers
//!
//! - [`FileKeyProvider`] reads a PEM file from disk
//! - [`JwksKeyProvider`] fetches a JWKS-like document (Keycloak `certs`
//!   endpoint) and extracts a certificate through an [`Adapter`]
//! - [`StaticKeyProvider`] serves a PEM held in memory
//!
//! ## Caching
//!
//! The file and network providers fetch at most once. The first successful
//! result is kept for the lifetime of the provider; a failed attempt is not
//! cached, so the next call retries. Concurrent first calls share a single
//! read or fetch.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use pem::{EncodeConfig, LineEnding, Pem};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use url::Url;

use super::error::AuthError;

/// Field holding the certificate chain in a Keycloak key entry.
pub const DEFAULT_CERT_FIELD: &str = "x5c";

/// Default bound on a key endpoint round-trip.
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// PEM label put around extracted keys.
const PEM_TAG: &str = "PUBLIC KEY";

/// PEM-encoded public key bytes, shared between callers.
pub type PemKey = Arc<[u8]>;

/// Source of the PEM-encoded RSA public key used to verify tokens.
#[async_trait]
pub trait PublicKeyProvider: Send + Sync {
    /// Return the PEM bytes, fetching them on first use.
    async fn get(&self) -> Result<PemKey, AuthError>;
}

/// Reads the public key from a PEM file once and caches it.
#[derive(Debug)]
pub struct FileKeyProvider {
    path: PathBuf,
    cache: OnceCell<PemKey>,
}

impl FileKeyProvider {
    /// Create a provider for the given PEM file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: OnceCell::new(),
        }
    }

    /// Path of the key file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the key has been read successfully.
    pub fn is_cached(&self) -> bool {
        self.cache.initialized()
    }
}

#[async_trait]
impl PublicKeyProvider for FileKeyProvider {
    async fn get(&self) -> Result<PemKey, AuthError> {
        let key = self
            .cache
            .get_or_try_init(|| async {
                debug!(path = %self.path.display(), "Reading public key file");
                let pem = tokio::fs::read(&self.path).await.map_err(|e| {
                    AuthError::KeyRead(format!("{}: {e}", self.path.display()))
                })?;
                Ok::<_, AuthError>(PemKey::from(pem))
            })
            .await?;
        Ok(Arc::clone(key))
    }
}

/// Serves a PEM key supplied up front.
#[derive(Debug, Clone)]
pub struct StaticKeyProvider {
    pem: PemKey,
}

impl StaticKeyProvider {
    pub fn new(pem: impl Into<Vec<u8>>) -> Self {
        Self {
            pem: PemKey::from(pem.into()),
        }
    }
}

#[async_trait]
impl PublicKeyProvider for StaticKeyProvider {
    async fn get(&self) -> Result<PemKey, AuthError> {
        Ok(Arc::clone(&self.pem))
    }
}

/// Pulls the base64 key material out of a parsed key document.
pub trait Adapter: Send + Sync {
    /// Return the base64-encoded certificate or key.
    ///
    /// Must report a missing or mistyped field as [`AuthError::KeyNotFound`]
    /// instead of panicking.
    fn extract(&self, document: &Value) -> Result<String, AuthError>;
}

/// Keycloak-style adapter reading `keys[0].<field>[0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X5cAdapter {
    field: String,
}

impl X5cAdapter {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Name of the extracted field.
    pub fn field(&self) -> &str {
        &self.field
    }
}

impl Default for X5cAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_CERT_FIELD)
    }
}

impl Adapter for X5cAdapter {
    fn extract(&self, document: &Value) -> Result<String, AuthError> {
        let keys = document
            .get("keys")
            .and_then(Value::as_array)
            .ok_or_else(|| AuthError::KeyNotFound("keys".to_string()))?;
        let entry = keys
            .first()
            .ok_or_else(|| AuthError::KeyNotFound("keys[0]".to_string()))?;
        let chain = entry
            .get(self.field.as_str())
            .and_then(Value::as_array)
            .ok_or_else(|| AuthError::KeyNotFound(format!("keys[0].{}", self.field)))?;
        let cert = chain
            .first()
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|cert| !cert.is_empty())
            .ok_or_else(|| AuthError::KeyNotFound(format!("keys[0].{}[0]", self.field)))?;
        Ok(cert.to_string())
    }
}

/// Wrap base64 key material in `PUBLIC KEY` PEM armour.
pub fn public_key_pem(base64_key: &str) -> Result<Vec<u8>, AuthError> {
    let der = STANDARD
        .decode(base64_key.trim())
        .map_err(|e| AuthError::InvalidKey(format!("extracted key is not base64: {e}")))?;
    if der.is_empty() {
        return Err(AuthError::KeyNotFound("extracted key is empty".to_string()));
    }
    let config = EncodeConfig::new().set_line_ending(LineEnding::LF);
    Ok(pem::encode_config(&Pem::new(PEM_TAG, der), config).into_bytes())
}

/// Fetches the signing certificate from a JWKS-like endpoint and caches it.
pub struct JwksKeyProvider {
    /// Key endpoint (e.g. Keycloak `.../protocol/openid-connect/certs`)
    url: Url,
    /// Extraction strategy for the key document
    adapter: Arc<dyn Adapter>,
    /// HTTP client
    client: reqwest::Client,
    /// Per-request timeout
    timeout: Duration,
    /// PEM of the first successful fetch
    cache: OnceCell<PemKey>,
}

impl JwksKeyProvider {
    /// Create a provider for the given endpoint using the `x5c` adapter.
    pub fn new(url: &str) -> Result<Self, AuthError> {
        let url = Url::parse(url).map_err(|e| AuthError::KeyFetch(format!("invalid URL {url}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AuthError::KeyFetch(format!(
                "unsupported URL scheme '{}'",
                url.scheme()
            )));
        }
        if url.scheme() == "http" {
            warn!(url = %url, "Key endpoint is not using HTTPS");
        }
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AuthError::KeyFetch(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            url,
            adapter: Arc::new(X5cAdapter::default()),
            client,
            timeout: DEFAULT_FETCH_TIMEOUT,
            cache: OnceCell::new(),
        })
    }

    /// Use a custom extraction strategy.
    pub fn with_adapter(mut self, adapter: impl Adapter + 'static) -> Self {
        self.adapter = Arc::new(adapter);
        self
    }

    /// Bound each fetch by the given timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a preconfigured HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Get the endpoint URL.
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Check if a key has been fetched successfully.
    pub fn is_cached(&self) -> bool {
        self.cache.initialized()
    }

    /// Fetch the key document and convert the extracted field to PEM.
    async fn fetch(&self) -> Result<PemKey, AuthError> {
        info!(url = %self.url, "Fetching public key");
        let response = self
            .client
            .get(self.url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeyFetch(format!(
                "HTTP {} from key endpoint",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;
        let document: Value = serde_json::from_slice(&body)
            .map_err(|e| AuthError::MalformedKeyDocument(e.to_string()))?;

        let key = self.adapter.extract(&document)?;
        let pem = public_key_pem(&key)?;
        Ok(PemKey::from(pem))
    }
}

#[async_trait]
impl PublicKeyProvider for JwksKeyProvider {
    async fn get(&self) -> Result<PemKey, AuthError> {
        let key = self.cache.get_or_try_init(|| self.fetch()).await?;
        Ok(Arc::clone(key))
    }
}
