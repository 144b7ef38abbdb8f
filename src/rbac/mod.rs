// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Role Graph
//!
//! Role-based access control with inheritance.
//!
//! Each role owns a set of permissions and an ordered list of parent roles.
//! A role is granted an action when one of its own permissions matches, or
//! when any ancestor is granted it.
//!
//! ## Invariants
//!
//! - Role identifiers are trimmed and lower-cased
//! - The parent relation is acyclic at all times: `set_parents` and
//!   `add_parent` refuse edges that would close a cycle, and every file load
//!   runs a full cycle check before the new graph becomes visible
//! - Permissions are interned per graph and referenced from roles by id

pub mod file;
pub mod permission;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

use crate::users::roles::normalize;

pub use file::RbacDocument;
pub use permission::{MatchMode, Permission};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("role id must not be empty")]
    EmptyRoleId,

    #[error("role '{0}' already exists")]
    DuplicateRole(String),

    #[error("role '{0}' does not exist")]
    RoleNotFound(String),

    #[error("invalid permission pattern '{pattern}': {reason}")]
    InvalidPermission { pattern: String, reason: String },

    #[error("inheritance cycle: '{parent}' cannot be a parent of '{role}'")]
    InheritanceCycle { role: String, parent: String },
}

// =============================================================================
// Role snapshot
// =============================================================================

/// Point-in-time view of one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleEntry {
    pub id: String,
    /// Permission ids, sorted
    pub permissions: Vec<String>,
    /// Parent role ids, in assignment order
    pub parents: Vec<String>,
}

// =============================================================================
// Unlocked graph
// =============================================================================

#[derive(Debug, Clone, Default)]
struct RoleNode {
    permissions: BTreeSet<String>,
    parents: Vec<String>,
}

#[derive(Debug, Clone, Default)]
struct Graph {
    mode: MatchMode,
    roles: BTreeMap<String, RoleNode>,
    permissions: HashMap<String, Permission>,
}

impl Graph {
    fn new(mode: MatchMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    fn add_role(&mut self, id: &str) -> Result<RoleEntry, GraphError> {
        let id = role_id(id)?;
        if self.roles.contains_key(&id) {
            return Err(GraphError::DuplicateRole(id));
        }
        self.roles.insert(id.clone(), RoleNode::default());
        Ok(RoleEntry {
            id,
            permissions: Vec::new(),
            parents: Vec::new(),
        })
    }

    fn node_mut(&mut self, id: &str) -> Result<&mut RoleNode, GraphError> {
        self.roles
            .get_mut(id)
            .ok_or_else(|| GraphError::RoleNotFound(id.to_string()))
    }

    fn assign_permission(&mut self, role: &str, permission: &str) -> Result<(), GraphError> {
        let id = role_id(role)?;
        if !self.roles.contains_key(&id) {
            return Err(GraphError::RoleNotFound(id));
        }

        let key = permission.trim().to_string();
        if !self.permissions.contains_key(&key) {
            let permission = Permission::new(key.clone(), self.mode)?;
            self.permissions.insert(key.clone(), permission);
        }
        self.node_mut(&id)?.permissions.insert(key);
        Ok(())
    }

    fn revoke_permission(&mut self, role: &str, permission: &str) -> Result<bool, GraphError> {
        let id = role_id(role)?;
        let removed = self.node_mut(&id)?.permissions.remove(permission.trim());
        if removed {
            self.prune_permissions();
        }
        Ok(removed)
    }

    /// Drop interned permissions no role refers to any more.
    fn prune_permissions(&mut self) {
        let roles = &self.roles;
        self.permissions
            .retain(|id, _| roles.values().any(|node| node.permissions.contains(id)));
    }

    /// Resolve and validate candidate parents of `id`.
    fn check_parent(&self, id: &str, parent: &str) -> Result<String, GraphError> {
        let parent = role_id(parent)?;
        if !self.roles.contains_key(&parent) {
            return Err(GraphError::RoleNotFound(parent));
        }
        if parent == id || self.inherits_from(&parent, id) {
            return Err(GraphError::InheritanceCycle {
                role: id.to_string(),
                parent,
            });
        }
        Ok(parent)
    }

    fn set_parents<I, S>(&mut self, role: &str, parents: I) -> Result<(), GraphError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let id = role_id(role)?;
        if !self.roles.contains_key(&id) {
            return Err(GraphError::RoleNotFound(id));
        }

        let mut resolved: Vec<String> = Vec::new();
        for parent in parents {
            let parent = self.check_parent(&id, parent.as_ref())?;
            if !resolved.contains(&parent) {
                resolved.push(parent);
            }
        }

        self.node_mut(&id)?.parents = resolved;
        Ok(())
    }

    fn add_parent(&mut self, role: &str, parent: &str) -> Result<(), GraphError> {
        let id = role_id(role)?;
        if !self.roles.contains_key(&id) {
            return Err(GraphError::RoleNotFound(id));
        }
        let parent = self.check_parent(&id, parent)?;
        let node = self.node_mut(&id)?;
        if !node.parents.contains(&parent) {
            node.parents.push(parent);
        }
        Ok(())
    }

    fn remove_role(&mut self, role: &str) -> Result<(), GraphError> {
        let id = role_id(role)?;
        if self.roles.remove(&id).is_none() {
            return Err(GraphError::RoleNotFound(id));
        }
        for node in self.roles.values_mut() {
            node.parents.retain(|parent| parent != &id);
        }
        self.prune_permissions();
        Ok(())
    }

    /// Whether `ancestor` is reachable from `role` through parent edges.
    fn inherits_from(&self, role: &str, ancestor: &str) -> bool {
        let mut stack = vec![role];
        let mut visited: HashSet<&str> = HashSet::new();
        while let Some(id) = stack.pop() {
            if id == ancestor {
                return true;
            }
            if !visited.insert(id) {
                continue;
            }
            if let Some(node) = self.roles.get(id) {
                stack.extend(node.parents.iter().map(String::as_str));
            }
        }
        false
    }

    fn is_granted(&self, role: &str, action: &str) -> bool {
        let mut stack = vec![role];
        // Guards traversal even if a cycle slipped in.
        let mut visited: HashSet<&str> = HashSet::new();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(node) = self.roles.get(id) else {
                continue;
            };
            let granted = node.permissions.iter().any(|pid| {
                self.permissions
                    .get(pid)
                    .is_some_and(|permission| permission.matches(action))
            });
            if granted {
                return true;
            }
            stack.extend(node.parents.iter().rev().map(String::as_str));
        }
        false
    }

    fn check_cycles(&self) -> Result<(), GraphError> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Visiting,
            Done,
        }

        let mut marks: HashMap<&str, Mark> = HashMap::new();
        for root in self.roles.keys() {
            if marks.contains_key(root.as_str()) {
                continue;
            }
            marks.insert(root.as_str(), Mark::Visiting);
            let mut stack: Vec<(&str, usize)> = vec![(root.as_str(), 0)];

            while let Some(frame) = stack.last_mut() {
                let (id, next) = *frame;
                let parents = self
                    .roles
                    .get(id)
                    .map(|node| node.parents.as_slice())
                    .unwrap_or(&[]);

                if next < parents.len() {
                    frame.1 += 1;
                    let parent = parents[next].as_str();
                    match marks.get(parent) {
                        Some(Mark::Visiting) => {
                            return Err(GraphError::InheritanceCycle {
                                role: id.to_string(),
                                parent: parent.to_string(),
                            });
                        }
                        Some(Mark::Done) => {}
                        None => {
                            marks.insert(parent, Mark::Visiting);
                            stack.push((parent, 0));
                        }
                    }
                } else {
                    marks.insert(id, Mark::Done);
                    stack.pop();
                }
            }
        }
        Ok(())
    }

    fn entry(&self, id: &str) -> Option<RoleEntry> {
        self.roles.get(id).map(|node| RoleEntry {
            id: id.to_string(),
            permissions: node.permissions.iter().cloned().collect(),
            parents: node.parents.clone(),
        })
    }
}

fn role_id(id: &str) -> Result<String, GraphError> {
    let id = normalize(id);
    if id.is_empty() {
        return Err(GraphError::EmptyRoleId);
    }
    Ok(id)
}

// =============================================================================
// RoleGraph
// =============================================================================

/// Thread-safe role graph.
///
/// Create one per application (or per tenant) and share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct RoleGraph {
    mode: MatchMode,
    inner: RwLock<Graph>,
}

impl RoleGraph {
    /// Create an empty graph with unanchored permission matching.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with the given permission matching.
    pub fn with_match_mode(mode: MatchMode) -> Self {
        Self {
            mode,
            inner: RwLock::new(Graph::new(mode)),
        }
    }

    pub fn match_mode(&self) -> MatchMode {
        self.mode
    }

    /// Register a new role.
    pub fn add_role(&self, id: &str) -> Result<RoleEntry, GraphError> {
        let entry = self.inner.write().add_role(id)?;
        debug!(role = %entry.id, "Added role");
        Ok(entry)
    }

    /// Attach a permission to a role. Assigning a held permission is a no-op.
    pub fn assign_permission(&self, role: &str, permission: &str) -> Result<(), GraphError> {
        self.inner.write().assign_permission(role, permission)
    }

    /// Detach a permission from a role. Returns `false` if it was not held.
    pub fn revoke_permission(&self, role: &str, permission: &str) -> Result<bool, GraphError> {
        self.inner.write().revoke_permission(role, permission)
    }

    /// Replace the parents of a role.
    ///
    /// All ids must exist, and no parent may already inherit from the role.
    pub fn set_parents<I, S>(&self, role: &str, parents: I) -> Result<(), GraphError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.inner.write().set_parents(role, parents)
    }

    /// Append one parent to a role.
    pub fn add_parent(&self, role: &str, parent: &str) -> Result<(), GraphError> {
        self.inner.write().add_parent(role, parent)
    }

    /// Delete a role and every edge pointing at it.
    pub fn remove_role(&self, role: &str) -> Result<(), GraphError> {
        self.inner.write().remove_role(role)
    }

    pub fn get_role(&self, id: &str) -> Result<RoleEntry, GraphError> {
        let id = role_id(id)?;
        self.inner
            .read()
            .entry(&id)
            .ok_or(GraphError::RoleNotFound(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.read().roles.contains_key(&normalize(id))
    }

    pub fn len(&self) -> usize {
        self.inner.read().roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().roles.is_empty()
    }

    /// Check whether a role, directly or through its ancestors, is granted
    /// the action. The action is trimmed and lower-cased first; unknown
    /// roles are granted nothing.
    pub fn is_granted(&self, role: &str, action: &str) -> bool {
        let action = action.trim().to_lowercase();
        self.inner.read().is_granted(&normalize(role), &action)
    }

    /// Check whether any of the roles is granted the action.
    pub fn is_permitted<I, S>(&self, roles: I, action: &str) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let action = action.trim().to_lowercase();
        let graph = self.inner.read();
        roles
            .into_iter()
            .any(|role| graph.is_granted(&normalize(role.as_ref()), &action))
    }

    /// Verify the parent relation is acyclic.
    pub fn check_cycles(&self) -> Result<(), GraphError> {
        self.inner.read().check_cycles()
    }

    /// Snapshot of all roles, sorted by id.
    pub fn roles(&self) -> Vec<RoleEntry> {
        let graph = self.inner.read();
        graph.roles.keys().filter_map(|id| graph.entry(id)).collect()
    }

    /// Visit every role once.
    ///
    /// The visitor runs on a snapshot taken under the read lock, so it may
    /// call back into the graph; changes it makes are not reflected in the
    /// ongoing walk.
    pub fn walk<E, F>(&self, mut visitor: F) -> Result<(), E>
    where
        F: FnMut(&RoleEntry) -> Result<(), E>,
    {
        for entry in self.roles() {
            visitor(&entry)?;
        }
        Ok(())
    }

    /// Remove every role and permission.
    pub fn clear(&self) {
        *self.inner.write() = Graph::new(self.mode);
    }

    /// Swap in a fully built graph.
    fn replace(&self, graph: Graph) {
        *self.inner.write() = graph;
    }
}
