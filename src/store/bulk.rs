//! Multi-node updates: bulk import and node copy.
//!
//! There is no cross-file atomicity. Instead every precondition (target
//! existence, key and value validity) is checked for the whole batch before
//! any record is touched, and records are saved only after all of them were
//! updated in memory.

use crate::error::ApiError;
use crate::node::format::{parse_data, parse_full_data};
use crate::node::check_pair;
use crate::store::MetadataStore;
use std::collections::BTreeSet;
use tracing::info;

/// How imported values combine with what a node already holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Each imported key replaces that key's existing values
    #[default]
    Replace,
    /// Imported values are appended after existing ones
    Append,
}

/// A validated-then-applied batch of (node, key, value) writes
#[derive(Debug, Clone)]
pub struct ImportPlan {
    entries: Vec<(String, String, String)>,
    create: bool,
    mode: ImportMode,
}

impl ImportPlan {
    /// Batch for one node from `key: value` lines
    pub fn for_node(node: &str, data: &str) -> Self {
        let entries = parse_data(data)
            .into_iter()
            .map(|(k, v)| (node.to_string(), k, v))
            .collect();
        Self::from_entries(entries)
    }

    /// Batch spanning nodes from `node#key: value` lines
    pub fn from_full(data: &str) -> Result<Self, ApiError> {
        Ok(Self::from_entries(parse_full_data(data)?))
    }

    pub fn from_entries(entries: Vec<(String, String, String)>) -> Self {
        Self {
            entries,
            create: false,
            mode: ImportMode::default(),
        }
    }

    /// Allow nodes that do not exist yet to be created
    pub fn allow_create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub fn mode(mut self, mode: ImportMode) -> Self {
        self.mode = mode;
        self
    }

    /// Distinct target nodes, sorted
    pub fn nodes(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(n, _, _)| n.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Check every precondition without mutating anything
    pub fn validate(&self, store: &MetadataStore) -> Result<(), ApiError> {
        for node in self.nodes() {
            if node.is_empty() {
                return Err(ApiError::ValidationError(
                    "node name cannot be empty".to_string(),
                ));
            }
            if !self.create && !store.exists(&node) {
                return Err(ApiError::NotFound(format!(
                    "node {} does not exist, and creation not allowed",
                    node
                )));
            }
        }
        for (_, key, value) in &self.entries {
            check_pair(key, value)?;
        }
        Ok(())
    }

    /// Validate the whole batch, then apply it and save every touched node
    ///
    /// Returns the names of the nodes written.
    pub fn apply(&self, store: &mut MetadataStore) -> Result<Vec<String>, ApiError> {
        self.validate(store)?;

        let nodes = self.nodes();
        if self.mode == ImportMode::Replace {
            for (node, key, _) in &self.entries {
                store.node(node)?.delete(key);
            }
        }
        for (node, key, value) in &self.entries {
            store.node(node)?.add(key, value)?;
        }
        for node in &nodes {
            store.node(node)?.save()?;
        }

        info!(nodes = nodes.len(), values = self.entries.len(), "imported data");
        Ok(nodes)
    }
}

/// Copy every value of `src` into a new node `dst` and save it
pub fn copy_node(store: &mut MetadataStore, src: &str, dst: &str) -> Result<(), ApiError> {
    if !store.exists(src) {
        return Err(ApiError::NotFound(format!("node {} does not exist", src)));
    }
    if store.exists(dst) {
        return Err(ApiError::AlreadyExists(format!(
            "node {} already exists",
            dst
        )));
    }

    let source = store.load_node(src)?;
    // unsaved cached edits on dst must not leak into the copy
    store.evict(dst);
    let target = store.node(dst)?;
    for (key, value) in source.attrs().pairs() {
        target.add(key, value)?;
    }
    target.save()?;
    info!(src = %src, dst = %dst, "copied node");
    Ok(())
}
