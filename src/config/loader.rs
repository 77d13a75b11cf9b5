//! ConfigLoader: composes sources and deserializes to [`KvConfig`].

use super::{xdg, KvConfig};
use crate::error::ApiError;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the global file and environment.
    /// Precedence: defaults (lowest) -> global file -> environment (highest).
    pub fn load() -> Result<KvConfig, ApiError> {
        let mut builder = Config::builder();
        if let Ok(global) = xdg::global_config_path() {
            builder = builder.add_source(File::from(global).required(false));
        }
        Self::finish(builder)
    }

    /// Load configuration from a specific file with environment overlay.
    pub fn load_from_file(path: &Path) -> Result<KvConfig, ApiError> {
        if !path.is_file() {
            return Err(ApiError::ConfigError(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        let builder = Config::builder().add_source(File::from(path));
        Self::finish(builder)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<KvConfig, ApiError> {
        // KV__DATABASE__PATH -> database.path
        let builder = builder.add_source(
            Environment::with_prefix("KV")
                .separator("__")
                .try_parsing(true),
        );
        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}
