//! Key-path addressing: `<node>[#<key>[#<index>]]`.

use crate::error::ApiError;
use crate::store::MetadataStore;
use std::fmt;
use std::str::FromStr;

/// Separator between address segments
pub const SEPARATOR: char = '#';

/// Parsed key-path address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    pub node: String,
    pub key: Option<String>,
    pub index: Option<usize>,
}

impl KeyPath {
    /// Parse an address; the node segment must be non-empty
    ///
    /// An empty key segment counts as no key, and an index that is not a
    /// non-negative integer is dropped rather than rejected.
    pub fn parse(key_path: &str) -> Result<Self, ApiError> {
        let mut parts = key_path.splitn(3, SEPARATOR);
        let node = parts.next().unwrap_or_default();
        if node.is_empty() {
            return Err(ApiError::ValidationError(
                "invalid key path, cannot be empty".to_string(),
            ));
        }
        let key = parts
            .next()
            .filter(|k| !k.is_empty())
            .map(str::to_string);
        let index = match key {
            Some(_) => parts.next().and_then(|i| i.parse::<usize>().ok()),
            None => None,
        };
        Ok(Self {
            node: node.to_string(),
            key,
            index,
        })
    }
}

impl FromStr for KeyPath {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node)?;
        if let Some(key) = &self.key {
            write!(f, "{}{}", SEPARATOR, key)?;
            if let Some(index) = self.index {
                write!(f, "{}{}", SEPARATOR, index)?;
            }
        }
        Ok(())
    }
}

/// Expand an address into output lines, sorted lexicographically
///
/// - node only: every value of every key as `node#key[#i]: value`
/// - node and key: that key's values, bare unless `verbose`
///
/// The index segment is parsed but does not narrow the output.
/// An unknown node is `NotFound` when `raise_on_missing`, otherwise empty.
/// A missing key yields nothing.
pub fn expand(
    store: &mut MetadataStore,
    key_path: &str,
    verbose: bool,
    raise_on_missing: bool,
) -> Result<Vec<String>, ApiError> {
    let address = KeyPath::parse(key_path)?;

    if !store.is_mapped(&address.node) {
        if raise_on_missing {
            return Err(ApiError::NotFound(format!(
                "node {} does not exist",
                address.node
            )));
        }
        return Ok(Vec::new());
    }

    let node = store.node(&address.node)?;
    let mut res = Vec::new();
    match &address.key {
        None => {
            for (key, values) in node.attrs().iter() {
                res.extend(expand_values(&address.node, key, values, true));
            }
        }
        Some(key) => {
            if let Some(values) = node.attrs().values(key) {
                res.extend(expand_values(&address.node, key, values, verbose));
            }
        }
    }

    res.sort();
    Ok(res)
}

fn expand_values(
    node: &str,
    key: &str,
    values: &[String],
    verbose: bool,
) -> Vec<String> {
    let indexed = values.len() > 1;
    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            if !verbose {
                value.clone()
            } else if indexed {
                format!("{node}{SEPARATOR}{key}{SEPARATOR}{i}: {value}")
            } else {
                format!("{node}{SEPARATOR}{key}: {value}")
            }
        })
        .collect()
}
