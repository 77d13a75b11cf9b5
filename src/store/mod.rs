//! Metadata Store
//!
//! Owns the name -> path index for a whole database. Node names resolve to
//! deterministic, sharded file paths which are recorded in the metadata file
//! on first use and never change afterwards. Every metadata write is an
//! atomic replace.

pub mod bulk;
pub mod layout;
pub mod metadata;

use crate::error::{ApiError, StorageError};
use crate::node::NodeRecord;
use metadata::{Metadata, METADATA_FILE};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Handle on an opened database root
#[derive(Debug)]
pub struct MetadataStore {
    root: PathBuf,
    metadata_path: PathBuf,
    metadata: Metadata,
    /// Cache-aside node records keyed by name
    nodes: HashMap<String, NodeRecord>,
}

impl MetadataStore {
    /// Create a new database at `root`
    ///
    /// Fails with `AlreadyExists` if anything is already at `root`.
    pub fn init(root: impl AsRef<Path>) -> Result<(), ApiError> {
        let root = root.as_ref();
        if root.exists() {
            return Err(ApiError::AlreadyExists(format!(
                "{} exists, cannot create a kvdb there",
                root.display()
            )));
        }
        fs::create_dir_all(root).map_err(StorageError::IoError)?;
        Metadata::default().write_atomic(&root.join(METADATA_FILE))?;
        info!(root = %root.display(), "initialized kvdb");
        Ok(())
    }

    /// Open an existing database, validating its metadata
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ApiError> {
        let root = root.into();
        if root.as_os_str().is_empty() {
            return Err(ApiError::ConfigError("missing database path".to_string()));
        }
        let metadata_path = root.join(METADATA_FILE);
        let metadata = Metadata::read(&metadata_path)?;
        debug!(root = %root.display(), nodes = metadata.mapping.len(), "opened kvdb");
        Ok(Self {
            root,
            metadata_path,
            metadata,
            nodes: HashMap::new(),
        })
    }

    /// Re-read metadata from disk and drop every cached record
    pub fn refresh(&mut self) -> Result<(), ApiError> {
        self.metadata = Metadata::read(&self.metadata_path)?;
        self.nodes.clear();
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    /// Absolute path for `name`, assigning and persisting one if unmapped
    pub fn resolve(&mut self, name: &str) -> Result<PathBuf, ApiError> {
        if let Some(path) = self.node_path_if_mapped(name) {
            return Ok(path);
        }
        if name.is_empty() {
            return Err(ApiError::ValidationError(
                "node name cannot be empty".to_string(),
            ));
        }

        let relative = layout::node_relative_path(name);
        let relative_str = relative.to_str().ok_or_else(|| {
            StorageError::InvalidPath(format!("{} is not valid UTF-8", relative.display()))
        })?;

        let mut next = self.metadata.clone();
        next.mapping
            .insert(name.to_string(), relative_str.to_string());
        next.write_atomic(&self.metadata_path)?;
        self.metadata = next;

        debug!(node = %name, path = %relative.display(), "assigned node path");
        Ok(self.root.join(relative))
    }

    /// Absolute path for `name` without assigning one
    pub fn node_path_if_mapped(&self, name: &str) -> Option<PathBuf> {
        self.metadata
            .mapping
            .get(name)
            .map(|relative| self.root.join(relative))
    }

    /// Whether `name` is in the mapping, saved or not
    pub fn is_mapped(&self, name: &str) -> bool {
        self.metadata.mapping.contains_key(name)
    }

    /// Whether `name` is mapped and its backing file has been written
    pub fn exists(&self, name: &str) -> bool {
        self.node_path_if_mapped(name)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// All mapped names, sorted
    pub fn list(&self) -> Vec<String> {
        // BTreeMap keys are already in lexicographic order
        self.metadata.mapping.keys().cloned().collect()
    }

    /// Remove a node's file and mapping entry
    pub fn delete(&mut self, name: &str) -> Result<(), ApiError> {
        let path = self
            .node_path_if_mapped(name)
            .ok_or_else(|| ApiError::NotFound(format!("node {} does not exist", name)))?;

        match fs::remove_file(&path) {
            Ok(()) => {}
            // mapped but never saved
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(StorageError::NodeIo {
                    node: name.to_string(),
                    path,
                    source,
                }
                .into())
            }
        }

        let mut next = self.metadata.clone();
        next.mapping.remove(name);
        next.write_atomic(&self.metadata_path)?;
        self.metadata = next;
        self.nodes.remove(name);

        info!(node = %name, "deleted node");
        Ok(())
    }

    /// Cached record for `name`, resolving and loading it on first access
    pub fn node(&mut self, name: &str) -> Result<&mut NodeRecord, ApiError> {
        if !self.nodes.contains_key(name) {
            let record = self.load_node(name)?;
            self.nodes.insert(name.to_string(), record);
        }
        self.nodes
            .get_mut(name)
            .ok_or_else(|| ApiError::NotFound(format!("node {} does not exist", name)))
    }

    /// Fresh record for `name`, bypassing the cache
    pub fn load_node(&mut self, name: &str) -> Result<NodeRecord, ApiError> {
        let path = self.resolve(name)?;
        NodeRecord::open(name, path)
    }

    /// Drop a cached record so the next [`node`](Self::node) call reads disk
    pub fn evict(&mut self, name: &str) {
        self.nodes.remove(name);
    }
}
