//! Line codec for node record files and bulk data.
//!
//! A record file is a sequence of `key: value` lines. Blank lines and lines
//! starting with `#` are ignored, and a key repeats once per value.

use crate::error::ApiError;
use crate::node::attrs::AttributeMap;

/// Parse `key: value` lines into (key, value) pairs, in file order
///
/// Lines without a colon carry no pair and are skipped.
pub fn parse_data(data: &str) -> Vec<(String, String)> {
    data.lines()
        .filter_map(|line| {
            if line.trim().is_empty() || line.starts_with('#') {
                return None;
            }
            let (key, value) = line.split_once(':')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Parse `node#key: value` lines into (node, key, value) triples
pub fn parse_full_data(data: &str) -> Result<Vec<(String, String, String)>, ApiError> {
    let mut entries = Vec::new();
    for (lhs, value) in parse_data(data) {
        let (node, key) = lhs.split_once('#').ok_or_else(|| {
            ApiError::ValidationError(format!("{:?} is not of the form node#key", lhs))
        })?;
        if node.is_empty() || key.is_empty() {
            return Err(ApiError::ValidationError(format!(
                "{:?} is not of the form node#key",
                lhs
            )));
        }
        entries.push((node.to_string(), key.to_string(), value));
    }
    Ok(entries)
}

/// Render attributes as record file contents
pub fn render(attrs: &AttributeMap) -> String {
    let mut out = String::new();
    for (key, value) in attrs.pairs() {
        out.push_str(key);
        out.push_str(": ");
        out.push_str(value);
        out.push('\n');
    }
    out
}
