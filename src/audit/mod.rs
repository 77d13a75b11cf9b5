//! Audit Engine
//!
//! Walks every node in a store, merges the schema rules that apply to it, and
//! reports violations as data. Node problems never abort an audit.

pub mod config;
pub mod schema_file;
pub mod validator;

pub use config::{NodeSchema, PatternRules, SchemaConfig, SCHEMA_FILE};
pub use validator::{Predicate, Validator, REFERENCE_SIGIL};

use crate::error::ApiError;
use crate::node::AttributeMap;
use crate::store::MetadataStore;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// node name -> ordered violation messages; clean nodes are absent
pub type AuditReport = BTreeMap<String, Vec<String>>;

/// Runs a [`SchemaConfig`] against a store
#[derive(Debug, Default)]
pub struct AuditEngine {
    config: SchemaConfig,
}

impl AuditEngine {
    pub fn new(config: SchemaConfig) -> Self {
        Self { config }
    }

    /// Engine using the store's `schema.toml`, if any
    pub fn for_store(store: &MetadataStore) -> Result<Self, ApiError> {
        Ok(Self::new(SchemaConfig::load(store.root())?))
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SchemaConfig {
        &mut self.config
    }

    /// Audit every mapped node
    ///
    /// Records come from the store's cache, so unsaved in-memory edits are
    /// audited as they stand.
    pub fn audit(&self, store: &mut MetadataStore) -> AuditReport {
        let mut report = AuditReport::new();

        for name in store.list() {
            let schema = self.config.schema_for(&name);
            let attrs = match store.node(&name) {
                Ok(node) => node.attrs().clone(),
                Err(e) => {
                    report
                        .entry(name)
                        .or_default()
                        .push(format!("failed to load: {}", e));
                    continue;
                }
            };

            let mut messages = audit_required(&attrs, &schema);
            messages.extend(audit_validations(&name, &attrs, &schema, store));
            if !messages.is_empty() {
                debug!(node = %name, violations = messages.len(), "audit violations");
                report.insert(name, messages);
            }
        }

        if !report.is_empty() {
            warn!(nodes = report.len(), "audit found violations");
        }
        report
    }
}

fn audit_required(attrs: &AttributeMap, schema: &NodeSchema) -> Vec<String> {
    schema
        .required
        .iter()
        .filter(|key| !attrs.contains_key(key))
        .map(|key| format!("{}: missing required key", key))
        .collect()
}

fn audit_validations(
    name: &str,
    attrs: &AttributeMap,
    schema: &NodeSchema,
    store: &MetadataStore,
) -> Vec<String> {
    let mut messages = Vec::new();
    for (key, validators) in &schema.validate {
        let Some(value) = attrs.get(key) else {
            continue;
        };
        for validator in validators {
            if !validator.check(&value, name, store) {
                messages.push(format!("{}: {}: {}", key, value.repr(), validator.reason()));
            }
        }
    }
    messages
}
