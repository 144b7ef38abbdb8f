// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Pattern-based permissions.
//!
//! A permission identifier doubles as a regular expression matched against
//! action strings such as `get::data:tags`, so `get::data:.*` grants a whole
//! subtree.

use regex::Regex;
use tracing::warn;

use super::GraphError;

/// How permission patterns are matched against actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// Pattern may match anywhere in the action. `get::data` then also
    /// grants `get::data:secrets`, so patterns should carry `^...$`.
    #[default]
    Unanchored,
    /// Pattern must match the whole action.
    Anchored,
}

/// Compiled permission.
#[derive(Debug, Clone)]
pub struct Permission {
    id: String,
    pattern: Regex,
}

impl Permission {
    pub fn new(id: impl Into<String>, mode: MatchMode) -> Result<Self, GraphError> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(GraphError::InvalidPermission {
                pattern: id,
                reason: "empty pattern".to_string(),
            });
        }

        let source = match mode {
            MatchMode::Unanchored => {
                if !(id.starts_with('^') && id.ends_with('$')) {
                    warn!(permission = %id, "Permission pattern is not anchored and may match unintended actions");
                }
                id.clone()
            }
            MatchMode::Anchored => format!("^(?:{id})$"),
        };

        let pattern = Regex::new(&source).map_err(|e| GraphError::InvalidPermission {
            pattern: id.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self { id, pattern })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Check whether the action is covered by this permission.
    pub fn matches(&self, action: &str) -> bool {
        self.pattern.is_match(action)
    }
}

impl PartialEq for Permission {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Permission {}
