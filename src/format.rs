// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON/YAML document files.
//!
//! Format is picked from the file extension: `.json` is JSON, anything else
//! is treated as YAML.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ConfigError;

/// On-disk document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
}

impl FileFormat {
    /// Detect the format from the file extension.
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => FileFormat::Json,
            _ => FileFormat::Yaml,
        }
    }
}

/// Read and parse a document.
pub fn read_document<T: DeserializeOwned>(path: &Path, format: FileFormat) -> Result<T, ConfigError> {
    let data = fs::read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    match format {
        FileFormat::Json => serde_json::from_slice(&data).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        }),
        FileFormat::Yaml => serde_yaml::from_slice(&data).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Serialize and write a document, replacing the file.
pub fn write_document<T: Serialize>(path: &Path, format: FileFormat, value: &T) -> Result<(), ConfigError> {
    let data = match format {
        FileFormat::Json => {
            let mut data = serde_json::to_vec_pretty(value).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?;
            data.push(b'\n');
            data
        }
        FileFormat::Yaml => serde_yaml::to_string(value)
            .map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
            .into_bytes(),
    };
    fs::write(path, data).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}
