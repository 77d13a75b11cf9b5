//! The `.kvdb` metadata file: format version plus the name -> path mapping.

use crate::error::{ApiError, StorageError};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// File name of the metadata file inside a database root
pub const METADATA_FILE: &str = ".kvdb";

/// The only metadata version this store reads and writes
pub const METADATA_VERSION: &str = "1";

/// Parsed metadata
///
/// `mapping` is the sole source of truth for which node names are known.
/// Paths are relative to the database root unless absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub version: String,
    pub mapping: BTreeMap<String, String>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            version: METADATA_VERSION.to_string(),
            mapping: BTreeMap::new(),
        }
    }
}

impl Metadata {
    /// Read and validate metadata from `path`
    pub fn read(path: &Path) -> Result<Self, ApiError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ApiError::NotFound(format!(
                    "can't see {}",
                    path.display()
                )));
            }
            Err(e) => return Err(StorageError::IoError(e).into()),
        };
        Self::parse(path, &raw)
    }

    /// Validate raw metadata text; `path` is only used in error messages
    pub fn parse(path: &Path, raw: &str) -> Result<Self, ApiError> {
        let doc: Value = serde_json::from_str(raw)
            .map_err(|e| ApiError::corrupt(path, format!("error parsing: {}", e)))?;
        let obj = doc
            .as_object()
            .ok_or_else(|| ApiError::corrupt(path, "metadata is not an object"))?;

        let mapping = obj
            .get("mapping")
            .and_then(Value::as_object)
            .ok_or_else(|| ApiError::corrupt(path, "mapping is not a hash"))?;

        let version = obj
            .get("version")
            .ok_or_else(|| ApiError::corrupt(path, "version is missing"))?;
        if version.as_str() != Some(METADATA_VERSION) {
            return Err(ApiError::corrupt(
                path,
                format!("unknown metadata version {}", version),
            ));
        }

        let mut parsed = BTreeMap::new();
        for (name, node_path) in mapping {
            let node_path = node_path.as_str().ok_or_else(|| {
                ApiError::corrupt(path, format!("mapping for {:?} is not a path string", name))
            })?;
            parsed.insert(name.clone(), node_path.to_string());
        }

        Ok(Self {
            version: METADATA_VERSION.to_string(),
            mapping: parsed,
        })
    }

    /// Replace the metadata file atomically
    ///
    /// Contents go to a temporary file in the same directory, are synced, and
    /// then renamed over `path`, so readers only ever see a complete file.
    pub fn write_atomic(&self, path: &Path) -> Result<(), ApiError> {
        let dir = path.parent().ok_or_else(|| {
            StorageError::InvalidPath(format!("{} has no parent directory", path.display()))
        })?;
        let mut body = serde_json::to_string_pretty(self)
            .map_err(|e| StorageError::IoError(std::io::Error::other(e)))?;
        body.push('\n');

        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(StorageError::IoError)?;
        temp.write_all(body.as_bytes())
            .map_err(StorageError::IoError)?;
        temp.as_file().sync_all().map_err(StorageError::IoError)?;
        temp.persist(path)
            .map_err(|e| StorageError::IoError(e.error))?;

        debug!(path = %path.display(), nodes = self.mapping.len(), "wrote metadata");
        Ok(())
    }
}
