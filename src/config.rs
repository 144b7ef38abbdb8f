// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the [`Settings`] loaded from
//! them at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `AUTH_PUBLIC_KEY_FILE` | PEM file holding the token signing key | - |
//! | `AUTH_JWKS_URL` | JWKS-like endpoint serving the signing key | - |
//! | `AUTH_JWKS_FIELD` | Certificate field of the first key entry | `x5c` |
//! | `AUTH_JWKS_TIMEOUT_SECS` | Key fetch timeout | `10` |
//! | `AUTH_ISSUER` | Expected JWT issuer claim | Optional |
//! | `AUTH_AUDIENCE` | Expected JWT audience claim | Optional |
//! | `AUTH_IDENTITY_CLAIM` | Claim keying the user directory | `email` |
//! | `AUTH_POLICY` | `simple`, `rbac` or `none` | `simple` |
//! | `AUTH_USER_DICTIONARY` | User/role file | `config/users.yaml` |
//! | `AUTH_RBAC_CONFIG` | Role graph file | Optional |
//! | `AUTH_ANCHOR_PERMISSIONS` | Match permissions against whole actions | `false` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! Without a key source authentication is disabled and every request passes
//! through. Setting both key sources is an error.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::claims::DEFAULT_IDENTITY_CLAIM;
use crate::auth::keys::DEFAULT_CERT_FIELD;
use crate::error::ConfigError;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const PUBLIC_KEY_FILE_ENV: &str = "AUTH_PUBLIC_KEY_FILE";
pub const JWKS_URL_ENV: &str = "AUTH_JWKS_URL";
pub const JWKS_FIELD_ENV: &str = "AUTH_JWKS_FIELD";
pub const JWKS_TIMEOUT_ENV: &str = "AUTH_JWKS_TIMEOUT_SECS";
pub const ISSUER_ENV: &str = "AUTH_ISSUER";
pub const AUDIENCE_ENV: &str = "AUTH_AUDIENCE";
pub const IDENTITY_CLAIM_ENV: &str = "AUTH_IDENTITY_CLAIM";
pub const POLICY_ENV: &str = "AUTH_POLICY";
pub const USER_DICTIONARY_ENV: &str = "AUTH_USER_DICTIONARY";
pub const RBAC_CONFIG_ENV: &str = "AUTH_RBAC_CONFIG";
pub const ANCHOR_PERMISSIONS_ENV: &str = "AUTH_ANCHOR_PERMISSIONS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_USER_DICTIONARY: &str = "config/users.yaml";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";
const DEFAULT_JWKS_TIMEOUT_SECS: u64 = 10;

/// Authorization model applied by the middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    #[default]
    Simple,
    Rbac,
    /// Verify tokens only
    None,
}

impl FromStr for PolicyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(PolicyKind::Simple),
            "rbac" => Ok(PolicyKind::Rbac),
            "none" => Ok(PolicyKind::None),
            other => Err(ConfigError::InvalidSetting {
                name: POLICY_ENV,
                reason: format!("unknown policy '{other}' (expected simple, rbac or none)"),
            }),
        }
    }
}

/// Where the token signing key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    File(PathBuf),
    Jwks {
        url: String,
        field: String,
        timeout: Duration,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    /// `None` disables authentication
    pub key_source: Option<KeySource>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub identity_claim: String,
    pub policy: PolicyKind,
    pub user_dictionary: PathBuf,
    pub rbac_config: Option<PathBuf>,
    pub anchor_permissions: bool,
    pub log_format: LogFormat,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let host = var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match var(PORT_ENV) {
            Some(port) => parse(PORT_ENV, &port)?,
            None => DEFAULT_PORT,
        };
        let bind_addr = format!("{host}:{port}")
            .parse()
            .map_err(|e| ConfigError::InvalidSetting {
                name: HOST_ENV,
                reason: format!("invalid bind address '{host}:{port}': {e}"),
            })?;

        let key_source = match (var(PUBLIC_KEY_FILE_ENV), var(JWKS_URL_ENV)) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::InvalidSetting {
                    name: JWKS_URL_ENV,
                    reason: format!("cannot be combined with {PUBLIC_KEY_FILE_ENV}"),
                });
            }
            (Some(path), None) => Some(KeySource::File(PathBuf::from(path))),
            (None, Some(url)) => {
                let timeout = match var(JWKS_TIMEOUT_ENV) {
                    Some(secs) => parse(JWKS_TIMEOUT_ENV, &secs)?,
                    None => DEFAULT_JWKS_TIMEOUT_SECS,
                };
                Some(KeySource::Jwks {
                    url,
                    field: var(JWKS_FIELD_ENV).unwrap_or_else(|| DEFAULT_CERT_FIELD.to_string()),
                    timeout: Duration::from_secs(timeout),
                })
            }
            (None, None) => None,
        };

        let policy = match var(POLICY_ENV) {
            Some(policy) => policy.parse()?,
            None => PolicyKind::default(),
        };

        let anchor_permissions = match var(ANCHOR_PERMISSIONS_ENV) {
            Some(flag) => parse_bool(ANCHOR_PERMISSIONS_ENV, &flag)?,
            None => false,
        };

        let log_format = match var(LOG_FORMAT_ENV).as_deref() {
            Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            bind_addr,
            key_source,
            issuer: var(ISSUER_ENV),
            audience: var(AUDIENCE_ENV),
            identity_claim: var(IDENTITY_CLAIM_ENV)
                .unwrap_or_else(|| DEFAULT_IDENTITY_CLAIM.to_string()),
            policy,
            user_dictionary: PathBuf::from(
                var(USER_DICTIONARY_ENV).unwrap_or_else(|| DEFAULT_USER_DICTIONARY.to_string()),
            ),
            rbac_config: var(RBAC_CONFIG_ENV).map(PathBuf::from),
            anchor_permissions,
            log_format,
        })
    }
}

fn parse<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidSetting {
        name,
        reason: format!("'{value}': {e}"),
    })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidSetting {
            name,
            reason: format!("'{value}' is not a boolean"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_disable_authentication() {
        let settings = settings(&[]).unwrap();
        assert_eq!(settings.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(settings.key_source, None);
        assert_eq!(settings.policy, PolicyKind::Simple);
        assert_eq!(settings.identity_claim, "email");
        assert_eq!(settings.user_dictionary, PathBuf::from("config/users.yaml"));
        assert!(!settings.anchor_permissions);
        assert_eq!(settings.log_format, LogFormat::Pretty);
    }

    #[test]
    fn jwks_source_with_defaults() {
        let settings = settings(&[(JWKS_URL_ENV, "https://sso.example.com/certs")]).unwrap();
        assert_eq!(
            settings.key_source,
            Some(KeySource::Jwks {
                url: "https://sso.example.com/certs".to_string(),
                field: "x5c".to_string(),
                timeout: Duration::from_secs(10),
            })
        );
    }

    #[test]
    fn both_key_sources_is_an_error() {
        let err = settings(&[
            (PUBLIC_KEY_FILE_ENV, "/etc/rolegate/key.pem"),
            (JWKS_URL_ENV, "https://sso.example.com/certs"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { name: JWKS_URL_ENV, .. }));
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(settings(&[(PORT_ENV, "http")]).is_err());
        assert!(settings(&[(POLICY_ENV, "acl")]).is_err());
        assert!(settings(&[(ANCHOR_PERMISSIONS_ENV, "maybe")]).is_err());
        assert!(settings(&[(JWKS_URL_ENV, "https://x"), (JWKS_TIMEOUT_ENV, "-1")]).is_err());
    }

    #[test]
    fn explicit_values_are_used() {
        let settings = settings(&[
            (PUBLIC_KEY_FILE_ENV, "keys/signing.pem"),
            (POLICY_ENV, "RBAC"),
            (RBAC_CONFIG_ENV, "config/rbac.json"),
            (ANCHOR_PERMISSIONS_ENV, "true"),
            (IDENTITY_CLAIM_ENV, "preferred_username"),
            (LOG_FORMAT_ENV, "json"),
            (ISSUER_ENV, " "),
        ])
        .unwrap();
        assert_eq!(
            settings.key_source,
            Some(KeySource::File(PathBuf::from("keys/signing.pem")))
        );
        assert_eq!(settings.policy, PolicyKind::Rbac);
        assert_eq!(settings.rbac_config, Some(PathBuf::from("config/rbac.json")));
        assert!(settings.anchor_permissions);
        assert_eq!(settings.identity_claim, "preferred_username");
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(settings.issuer, None);
    }
}
