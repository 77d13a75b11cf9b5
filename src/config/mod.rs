//! Configuration
//!
//! Layered settings for the `kv` tool: built-in defaults, the global
//! `config.toml`, then `KV__*` environment variables.

pub mod loader;
pub mod xdg;

pub use loader::ConfigLoader;

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming the database root
pub const DATABASE_ENV: &str = "KVDB_PATH";

/// Database location settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database root directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KvConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl KvConfig {
    /// Pick the database root: explicit flag, then `KVDB_PATH`, then config
    pub fn database_path(&self, flag: Option<PathBuf>) -> Result<PathBuf, ApiError> {
        if let Some(p) = flag.filter(|p| !p.as_os_str().is_empty()) {
            return Ok(p);
        }
        if let Ok(env_path) = std::env::var(DATABASE_ENV) {
            if !env_path.is_empty() {
                return Ok(PathBuf::from(env_path));
            }
        }
        self.database
            .path
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| {
                ApiError::ConfigError(format!(
                    "no database path given (use -d, {} or database.path)",
                    DATABASE_ENV
                ))
            })
    }
}
