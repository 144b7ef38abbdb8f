// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User dictionary files.
//!
//! ```yaml
//! users:
//!   - user: jane.doe@example.com
//!     roles: [admin, editor]
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Role, UserDirectory, UserProfile};
use crate::error::ConfigError;
use crate::format::{read_document, write_document, FileFormat};

/// Role assignment of a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRoles {
    pub user: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Contents of a user dictionary file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserDictionary {
    #[serde(default)]
    pub users: Vec<UserRoles>,
}

impl UserDirectory {
    /// Replace the directory with the contents of a file.
    ///
    /// Role strings other than the four well-known roles are dropped. On
    /// error the directory is left untouched.
    pub fn load_from_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        self.load_with_format(path, FileFormat::detect(path))
    }

    pub fn load_with_format(&self, path: &Path, format: FileFormat) -> Result<(), ConfigError> {
        let dictionary: UserDictionary = read_document(path, format)?;
        let count = dictionary.users.len();
        self.replace_with(dictionary);
        info!(path = %path.display(), users = count, "Loaded user dictionary");
        Ok(())
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        self.save_with_format(path, FileFormat::detect(path))
    }

    pub fn save_with_format(&self, path: &Path, format: FileFormat) -> Result<(), ConfigError> {
        write_document(path, format, &self.to_dictionary())
    }

    /// Current contents, users and roles sorted.
    pub fn to_dictionary(&self) -> UserDictionary {
        let users = self
            .snapshot()
            .into_iter()
            .map(|(user, profile)| UserRoles {
                user,
                roles: profile.roles().into_iter().map(String::from).collect(),
            })
            .collect();
        UserDictionary { users }
    }

    /// Replace the directory with the given dictionary.
    pub fn replace_with(&self, dictionary: UserDictionary) {
        let mut users = HashMap::with_capacity(dictionary.users.len());
        for entry in dictionary.users {
            let mut profile = UserProfile::new();
            for name in &entry.roles {
                match Role::well_known(name) {
                    Some(role) => {
                        profile.add_role(role);
                    }
                    None => debug!(user = %entry.user, role = %name, "Dropping unknown role"),
                }
            }
            users.insert(entry.user, profile);
        }
        self.replace(users);
    }
}
