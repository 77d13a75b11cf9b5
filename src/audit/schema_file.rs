//! Serde model of the `schema.toml` description.
//!
//! ```toml
//! # rules for every node
//! required = { owner = ["reference"] }
//!
//! [[nodes]]
//! pattern = "^host/"
//! required = { ip = ["single_value"] }
//! optional = { alias = ["multi_value"] }
//! validate = { ip = [{ reason = "must be dotted quad", matches = '^\d+\.\d+\.\d+\.\d+$' }] }
//! ```

use super::validator::Validator;
use crate::error::ApiError;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Whole schema file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaFile {
    #[serde(default)]
    pub required: BTreeMap<String, Vec<ValidatorSpec>>,
    #[serde(default)]
    pub optional: BTreeMap<String, Vec<ValidatorSpec>>,
    #[serde(default)]
    pub validate: BTreeMap<String, Vec<ValidatorSpec>>,
    #[serde(default)]
    pub nodes: Vec<NodeSection>,
}

/// One `[[nodes]]` block
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSection {
    pub pattern: String,
    #[serde(default)]
    pub required: BTreeMap<String, Vec<ValidatorSpec>>,
    #[serde(default)]
    pub optional: BTreeMap<String, Vec<ValidatorSpec>>,
    #[serde(default)]
    pub validate: BTreeMap<String, Vec<ValidatorSpec>>,
}

/// A built-in name, or a user-defined regex predicate
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ValidatorSpec {
    Builtin(String),
    Matches { reason: String, matches: String },
}

impl ValidatorSpec {
    pub fn build(&self) -> Result<Validator, ApiError> {
        match self {
            ValidatorSpec::Builtin(name) => Validator::builtin(name),
            ValidatorSpec::Matches { reason, matches } => {
                let re = Regex::new(matches).map_err(|e| {
                    ApiError::ConfigError(format!("invalid validator regex {:?}: {}", matches, e))
                })?;
                Ok(Validator::custom(reason.clone(), move |value, _, _| {
                    value.values().iter().all(|v| re.is_match(v))
                }))
            }
        }
    }
}
