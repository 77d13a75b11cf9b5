//! In-memory attribute multimap for a single node.

use crate::error::ApiError;
use crate::types::AttrValue;
use std::collections::BTreeMap;

/// Characters a key may never contain
pub const FORBIDDEN_KEY_CHARS: [char; 5] = [':', '#', '\'', '"', ' '];

/// Key validity: non-empty, free of whitespace and [`FORBIDDEN_KEY_CHARS`]
pub fn key_valid(key: &str) -> bool {
    !key.is_empty()
        && !key
            .chars()
            .any(|c| FORBIDDEN_KEY_CHARS.contains(&c) || c.is_whitespace())
}

/// Value validity: non-empty, single-line, no leading or trailing whitespace
///
/// Record lines are trimmed on load, so anything `trim` would change could
/// not survive a save and reload.
pub fn value_valid(value: &str) -> bool {
    !value.is_empty()
        && value.trim() == value
        && !value.contains(|c: char| c == '\n' || c == '\r')
}

fn check_key(key: &str) -> Result<(), ApiError> {
    if !key_valid(key) {
        return Err(ApiError::ValidationError(format!("key {:?} invalid", key)));
    }
    Ok(())
}

fn check_value(value: &str) -> Result<(), ApiError> {
    if !value_valid(value) {
        return Err(ApiError::ValidationError(format!(
            "value {:?} invalid",
            value
        )));
    }
    Ok(())
}

/// Validate a key/value pair without touching any map
pub fn check_pair(key: &str, value: &str) -> Result<(), ApiError> {
    check_key(key)?;
    check_value(value)
}

/// Ordered multimap: key -> non-empty list of non-empty values
///
/// Keys iterate in sorted order; values keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    attrs: BTreeMap<String, Vec<String>>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scalar if one value is stored, list if several, `None` if absent
    pub fn get(&self, key: &str) -> Option<AttrValue> {
        self.attrs
            .get(key)
            .and_then(|values| AttrValue::from_values(values))
    }

    /// Raw ordered values for a key
    pub fn values(&self, key: &str) -> Option<&[String]> {
        self.attrs.get(key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.attrs.contains_key(key)
    }

    /// Append a value to a key, creating the key if needed
    pub fn add(&mut self, key: &str, value: &str) -> Result<(), ApiError> {
        check_pair(key, value)?;
        self.attrs
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
        Ok(())
    }

    /// Replace the whole value list of a key
    ///
    /// Every value is checked before anything is replaced. An empty list is
    /// rejected, since a key never maps to zero values.
    pub fn set(&mut self, key: &str, value: impl Into<AttrValue>) -> Result<(), ApiError> {
        check_key(key)?;
        let values = value.into().into_values();
        if values.is_empty() {
            return Err(ApiError::ValidationError(format!(
                "key {:?} needs at least one value",
                key
            )));
        }
        for v in &values {
            check_value(v)?;
        }
        self.attrs.insert(key.to_string(), values);
        Ok(())
    }

    /// Remove a key entirely, returning its values
    pub fn delete(&mut self, key: &str) -> Option<Vec<String>> {
        self.attrs.remove(key)
    }

    pub fn clear(&mut self) {
        self.attrs.clear();
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attrs.keys().map(String::as_str)
    }

    /// Iterate keys with their full value lists
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Iterate every stored (key, value) pair, multiplicity preserved
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }
}
