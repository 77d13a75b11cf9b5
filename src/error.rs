//! Error types for the node store.

use std::path::PathBuf;
use thiserror::Error;

/// Filesystem-level failures
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Read or write of a single node's backing file failed
    #[error("node {node} failed at {}: {source}", path.display())]
    NodeIo {
        node: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// Top-level error surfaced by every store operation
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or unusable construction argument, or a malformed schema
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Unknown node name, or a database root without metadata
    #[error("not found: {0}")]
    NotFound(String),

    #[error("corrupt metadata at {}: {reason}", path.display())]
    CorruptMetadata { path: PathBuf, reason: String },

    #[error("validation failed: {0}")]
    ValidationError(String),

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),
}

/// Payload-free discriminant of [`ApiError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    AlreadyExists,
    NotFound,
    CorruptMetadata,
    Io,
    Validation,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::ConfigError(_) => ErrorKind::Config,
            ApiError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::CorruptMetadata { .. } => ErrorKind::CorruptMetadata,
            ApiError::ValidationError(_) => ErrorKind::Validation,
            ApiError::StorageError(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ApiError::CorruptMetadata {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        ApiError::StorageError(StorageError::IoError(e))
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(e: config::ConfigError) -> Self {
        ApiError::ConfigError(e.to_string())
    }
}
