// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! RBAC configuration files.
//!
//! ```yaml
//! roles:
//!   viewer: ["^get::data:.*$"]
//!   editor: ["^post::data:.*$"]
//! inher:
//!   editor: [viewer]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Graph, GraphError, RoleGraph};
use crate::error::ConfigError;
use crate::format::{read_document, write_document, FileFormat};

/// Contents of an RBAC file. Keys are kept sorted so saved files are stable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RbacDocument {
    /// Role id → permission patterns
    #[serde(default)]
    pub roles: BTreeMap<String, Vec<String>>,
    /// Role id → parent role ids
    #[serde(default)]
    pub inher: BTreeMap<String, Vec<String>>,
}

impl RoleGraph {
    /// Replace the graph with the contents of a file.
    ///
    /// The new graph is built and cycle-checked in isolation; on any error
    /// the current graph is left untouched.
    pub fn load_from_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        self.load_with_format(path, FileFormat::detect(path))
    }

    pub fn load_with_format(&self, path: &Path, format: FileFormat) -> Result<(), ConfigError> {
        let document: RbacDocument = read_document(path, format)?;
        self.replace_with(&document)?;
        info!(path = %path.display(), roles = document.roles.len(), "Loaded RBAC configuration");
        Ok(())
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        self.save_with_format(path, FileFormat::detect(path))
    }

    pub fn save_with_format(&self, path: &Path, format: FileFormat) -> Result<(), ConfigError> {
        write_document(path, format, &self.to_document())
    }

    /// Current contents. Roles without parents are omitted from `inher`.
    pub fn to_document(&self) -> RbacDocument {
        let mut document = RbacDocument::default();
        for entry in self.roles() {
            if !entry.parents.is_empty() {
                document.inher.insert(entry.id.clone(), entry.parents);
            }
            document.roles.insert(entry.id, entry.permissions);
        }
        document
    }

    /// Replace the graph with the given document.
    ///
    /// Roles named only in `inher` must also appear in `roles`.
    pub fn replace_with(&self, document: &RbacDocument) -> Result<(), GraphError> {
        let mut graph = Graph::new(self.mode);

        for (role, permissions) in &document.roles {
            graph.add_role(role)?;
            for permission in permissions {
                graph.assign_permission(role, permission)?;
            }
        }
        for (role, parents) in &document.inher {
            if parents.is_empty() {
                continue;
            }
            graph.set_parents(role, parents)?;
        }
        graph.check_cycles()?;

        self.replace(graph);
        Ok(())
    }
}
