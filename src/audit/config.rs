//! Schema Configuration
//!
//! Pattern-scoped audit rules. Each regex pattern carries required keys,
//! optional keys, and per-key validator lists. Rules are registered once,
//! either from the `schema.toml` file in a database root or through the
//! builder methods, and then merged per node by [`SchemaConfig::schema_for`].

use super::schema_file::{SchemaFile, ValidatorSpec};
use super::validator::Validator;
use crate::error::ApiError;
use crate::store::MetadataStore;
use crate::types::AttrValue;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// File name of the schema description inside a database root
pub const SCHEMA_FILE: &str = "schema.toml";

/// Pattern matching every node
pub const CATCH_ALL: &str = ".*";

/// Rules registered under one pattern, and the merged rules for one node
#[derive(Debug, Clone, Default)]
pub struct NodeSchema {
    pub required: Vec<String>,
    pub optional: Vec<String>,
    /// key -> validators, keys in first-registration order
    pub validate: Vec<(String, Vec<Validator>)>,
}

impl NodeSchema {
    fn add_validators(&mut self, key: &str, validators: impl IntoIterator<Item = Validator>) {
        match self.validate.iter_mut().find(|(k, _)| k == key) {
            Some((_, list)) => list.extend(validators),
            None => self
                .validate
                .push((key.to_string(), validators.into_iter().collect())),
        }
    }

    /// Validators registered for `key`, if any
    pub fn validators(&self, key: &str) -> Option<&[Validator]> {
        self.validate
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    fn merge(&mut self, other: &NodeSchema) {
        for key in &other.required {
            push_unique(&mut self.required, key);
        }
        for key in &other.optional {
            push_unique(&mut self.optional, key);
        }
        for (key, validators) in &other.validate {
            self.add_validators(key, validators.iter().cloned());
        }
    }
}

fn push_unique(keys: &mut Vec<String>, key: &str) {
    if !keys.iter().any(|k| k == key) {
        keys.push(key.to_string());
    }
}

fn resolve_builtins(names: &[&str]) -> Result<Vec<Validator>, ApiError> {
    names.iter().map(|name| Validator::builtin(name)).collect()
}

/// Registration handle for a single pattern
pub struct PatternRules<'a> {
    rules: &'a mut NodeSchema,
}

impl PatternRules<'_> {
    /// Require `key`, with the named built-in validators
    pub fn required(&mut self, key: &str, validators: &[&str]) -> Result<&mut Self, ApiError> {
        let validators = resolve_builtins(validators)?;
        self.rules.required.push(key.to_string());
        if !validators.is_empty() {
            self.rules.add_validators(key, validators);
        }
        Ok(self)
    }

    /// Allow `key`, with the named built-in validators
    pub fn optional(&mut self, key: &str, validators: &[&str]) -> Result<&mut Self, ApiError> {
        let validators = resolve_builtins(validators)?;
        self.rules.optional.push(key.to_string());
        if !validators.is_empty() {
            self.rules.add_validators(key, validators);
        }
        Ok(self)
    }

    /// Attach a user predicate to `key`
    pub fn validate<F>(&mut self, key: &str, reason: impl Into<String>, predicate: F) -> &mut Self
    where
        F: Fn(&AttrValue, &str, &MetadataStore) -> bool + Send + Sync + 'static,
    {
        self.rules
            .add_validators(key, [Validator::custom(reason, predicate)]);
        self
    }

    /// Attach an already-built validator to `key`
    pub fn validator(&mut self, key: &str, validator: Validator) -> &mut Self {
        self.rules.add_validators(key, [validator]);
        self
    }
}

/// The full rule table, patterns in first-registration order
#[derive(Debug, Default)]
pub struct SchemaConfig {
    patterns: Vec<(Regex, NodeSchema)>,
}

impl SchemaConfig {
    /// Empty schema: every audit passes
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `schema.toml` from a database root; a missing file is an empty schema
    pub fn load(root: &Path) -> Result<Self, ApiError> {
        let path = root.join(SCHEMA_FILE);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no schema file");
                return Ok(Self::new());
            }
            Err(e) => {
                return Err(ApiError::ConfigError(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        Self::from_toml_str(&raw)
            .map_err(|e| ApiError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    /// Build a schema from its TOML description
    pub fn from_toml_str(raw: &str) -> Result<Self, ApiError> {
        let file: SchemaFile = toml::from_str(raw)
            .map_err(|e| ApiError::ConfigError(format!("invalid schema: {}", e)))?;

        let mut config = Self::new();
        if !file.required.is_empty() || !file.optional.is_empty() || !file.validate.is_empty() {
            config.apply_section(CATCH_ALL, &file.required, &file.optional, &file.validate)?;
        }
        for section in &file.nodes {
            config.apply_section(
                &section.pattern,
                &section.required,
                &section.optional,
                &section.validate,
            )?;
        }
        debug!(patterns = config.patterns.len(), "loaded schema");
        Ok(config)
    }

    fn apply_section(
        &mut self,
        pattern: &str,
        required: &BTreeMap<String, Vec<ValidatorSpec>>,
        optional: &BTreeMap<String, Vec<ValidatorSpec>>,
        validate: &BTreeMap<String, Vec<ValidatorSpec>>,
    ) -> Result<(), ApiError> {
        let mut scope = self.nodes(pattern)?;
        for (key, specs) in required {
            scope.rules.required.push(key.clone());
            for spec in specs {
                scope.validator(key, spec.build()?);
            }
        }
        for (key, specs) in optional {
            scope.rules.optional.push(key.clone());
            for spec in specs {
                scope.validator(key, spec.build()?);
            }
        }
        for (key, specs) in validate {
            for spec in specs {
                scope.validator(key, spec.build()?);
            }
        }
        Ok(())
    }

    /// Rules for nodes whose name matches `pattern` (unanchored search)
    ///
    /// Registering the same pattern twice extends its existing rules.
    pub fn nodes(&mut self, pattern: &str) -> Result<PatternRules<'_>, ApiError> {
        let idx = match self.patterns.iter().position(|(re, _)| re.as_str() == pattern) {
            Some(idx) => idx,
            None => {
                let re = Regex::new(pattern).map_err(|e| {
                    ApiError::ConfigError(format!("invalid node pattern {:?}: {}", pattern, e))
                })?;
                self.patterns.push((re, NodeSchema::default()));
                self.patterns.len() - 1
            }
        };
        Ok(PatternRules {
            rules: &mut self.patterns[idx].1,
        })
    }

    /// Require `key` on every node
    pub fn required(&mut self, key: &str, validators: &[&str]) -> Result<&mut Self, ApiError> {
        self.nodes(CATCH_ALL)?.required(key, validators)?;
        Ok(self)
    }

    /// Allow `key` on every node
    pub fn optional(&mut self, key: &str, validators: &[&str]) -> Result<&mut Self, ApiError> {
        self.nodes(CATCH_ALL)?.optional(key, validators)?;
        Ok(self)
    }

    /// Attach a user predicate to `key` on every node
    pub fn validate<F>(
        &mut self,
        key: &str,
        reason: impl Into<String>,
        predicate: F,
    ) -> Result<&mut Self, ApiError>
    where
        F: Fn(&AttrValue, &str, &MetadataStore) -> bool + Send + Sync + 'static,
    {
        self.nodes(CATCH_ALL)?.validate(key, reason, predicate);
        Ok(self)
    }

    /// Merge the rules of every pattern matching `node`
    ///
    /// Required and optional keys are de-duplicated; validator lists for the
    /// same key are concatenated in pattern order.
    pub fn schema_for(&self, node: &str) -> NodeSchema {
        let mut merged = NodeSchema::default();
        for (re, rules) in &self.patterns {
            if re.is_match(node) {
                merged.merge(rules);
            }
        }
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
