//! Node Records
//!
//! A node is a named attribute set backed by exactly one text file. Records
//! follow a load -> mutate -> save lifecycle: mutations stay in memory until
//! [`NodeRecord::save`] rewrites the file, and the file's modification time is
//! remembered so staleness can be detected cheaply.

pub mod attrs;
pub mod format;

pub use attrs::{check_pair, key_valid, value_valid, AttributeMap};

use crate::error::{ApiError, StorageError};
use crate::types::AttrValue;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// One node's identity, backing file, and attributes
#[derive(Debug, Clone)]
pub struct NodeRecord {
    name: String,
    path: PathBuf,
    /// Modification time seen at last load/save; `None` means the file was absent
    mtime: Option<SystemTime>,
    attrs: AttributeMap,
}

impl NodeRecord {
    /// Create a record and load it from `path` if the file exists
    pub fn open(name: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self, ApiError> {
        let mut record = Self::empty(name, path);
        record.load()?;
        Ok(record)
    }

    /// Create a record without touching the filesystem
    pub fn empty(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            mtime: None,
            attrs: AttributeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mtime(&self) -> Option<SystemTime> {
        self.mtime
    }

    pub fn attrs(&self) -> &AttributeMap {
        &self.attrs
    }

    /// Replace the in-memory attributes from the backing file
    ///
    /// A missing file is not an error: attributes become empty and the
    /// modification time resets to "never". Lines whose key or value would be
    /// rejected by [`AttributeMap::add`] are skipped with a warning.
    pub fn load(&mut self) -> Result<(), ApiError> {
        let (contents, mtime) = match self.read_file() {
            Ok(found) => found,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(node = %self.name, "no backing file, starting empty");
                self.attrs.clear();
                self.mtime = None;
                return Ok(());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let mut attrs = AttributeMap::new();
        for (key, value) in format::parse_data(&contents) {
            if let Err(e) = attrs.add(&key, &value) {
                warn!(node = %self.name, path = %self.path.display(), "skipping line: {}", e);
            }
        }

        debug!(node = %self.name, keys = attrs.len(), "loaded node");
        self.attrs = attrs;
        self.mtime = Some(mtime);
        Ok(())
    }

    fn read_file(&self) -> std::io::Result<(String, SystemTime)> {
        let mtime = fs::metadata(&self.path)?.modified()?;
        let contents = fs::read_to_string(&self.path)?;
        Ok((contents, mtime))
    }

    /// Rewrite the backing file, creating parent directories as needed
    pub fn save(&mut self) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        fs::write(&self.path, format::render(&self.attrs)).map_err(|e| self.io_error(e))?;
        let mtime = fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .map_err(|e| self.io_error(e))?;
        self.mtime = Some(mtime);
        debug!(node = %self.name, path = %self.path.display(), "saved node");
        Ok(())
    }

    /// Whether the file's modification time moved since the last load/save,
    /// including appearing or disappearing
    pub fn changed(&self) -> bool {
        let current = fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok();
        current != self.mtime
    }

    /// Load again only when [`changed`](Self::changed); returns whether it did
    pub fn reload(&mut self) -> Result<bool, ApiError> {
        if !self.changed() {
            return Ok(false);
        }
        self.load()?;
        Ok(true)
    }

    pub fn get(&self, key: &str) -> Option<AttrValue> {
        self.attrs.get(key)
    }

    pub fn add(&mut self, key: &str, value: &str) -> Result<(), ApiError> {
        self.attrs.add(key, value)
    }

    pub fn set(&mut self, key: &str, value: impl Into<AttrValue>) -> Result<(), ApiError> {
        self.attrs.set(key, value)
    }

    pub fn delete(&mut self, key: &str) -> Option<Vec<String>> {
        self.attrs.delete(key)
    }

    fn io_error(&self, source: std::io::Error) -> ApiError {
        ApiError::StorageError(StorageError::NodeIo {
            node: self.name.clone(),
            path: self.path.clone(),
            source,
        })
    }
}
