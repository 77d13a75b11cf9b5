//! Validators evaluated against present attribute values during an audit.

use crate::error::ApiError;
use crate::store::MetadataStore;
use crate::types::AttrValue;
use std::fmt;
use std::sync::Arc;

/// Prefix marking a value as a reference to another node
pub const REFERENCE_SIGIL: char = '%';

/// User predicate: (value, node name, store) -> pass
pub type Predicate = Arc<dyn Fn(&AttrValue, &str, &MetadataStore) -> bool + Send + Sync>;

/// A (reason, predicate) pair
#[derive(Clone)]
pub enum Validator {
    /// Passes iff the value is a scalar
    SingleValue,
    /// Always passes; documents intent
    MultiValue,
    /// Every value is `%<name>` of an existing node
    Reference,
    Custom { reason: String, predicate: Predicate },
}

impl Validator {
    /// Look up a built-in by name
    pub fn builtin(name: &str) -> Result<Self, ApiError> {
        match name {
            "single_value" => Ok(Validator::SingleValue),
            "multi_value" => Ok(Validator::MultiValue),
            "reference" => Ok(Validator::Reference),
            other => Err(ApiError::ConfigError(format!(
                "unknown validation function {}",
                other
            ))),
        }
    }

    pub fn custom<F>(reason: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&AttrValue, &str, &MetadataStore) -> bool + Send + Sync + 'static,
    {
        Validator::Custom {
            reason: reason.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            Validator::SingleValue => "must be a single value",
            Validator::MultiValue => "never fails; no-op for verbose schemas",
            Validator::Reference => "invalid reference",
            Validator::Custom { reason, .. } => reason,
        }
    }

    pub fn check(&self, value: &AttrValue, node: &str, store: &MetadataStore) -> bool {
        match self {
            Validator::SingleValue => value.is_single(),
            Validator::MultiValue => true,
            Validator::Reference => value.values().iter().all(|v| {
                v.strip_prefix(REFERENCE_SIGIL)
                    .map(|target| store.exists(target))
                    .unwrap_or(false)
            }),
            Validator::Custom { predicate, .. } => predicate(value, node, store),
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::SingleValue => f.write_str("SingleValue"),
            Validator::MultiValue => f.write_str("MultiValue"),
            Validator::Reference => f.write_str("Reference"),
            Validator::Custom { reason, .. } => {
                f.debug_struct("Custom").field("reason", reason).finish()
            }
        }
    }
}
