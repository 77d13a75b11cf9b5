//! Core types shared across the node store.

use std::fmt;

/// Value view of a single key: a scalar when exactly one value is stored,
/// the ordered list otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Single(String),
    Multi(Vec<String>),
}

impl AttrValue {
    /// Collapse a stored value list into its presentation form
    pub fn from_values(values: &[String]) -> Option<Self> {
        match values {
            [] => None,
            [one] => Some(AttrValue::Single(one.clone())),
            many => Some(AttrValue::Multi(many.to_vec())),
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self, AttrValue::Single(_))
    }

    /// Coerce to a list, regardless of arity
    pub fn values(&self) -> &[String] {
        match self {
            AttrValue::Single(v) => std::slice::from_ref(v),
            AttrValue::Multi(v) => v,
        }
    }

    pub fn as_single(&self) -> Option<&str> {
        match self {
            AttrValue::Single(v) => Some(v),
            AttrValue::Multi(_) => None,
        }
    }

    /// Quoted representation used in audit messages: `"a"` or `["a", "b"]`
    pub fn repr(&self) -> String {
        match self {
            AttrValue::Single(v) => format!("{:?}", v),
            AttrValue::Multi(v) => format!("{:?}", v),
        }
    }

    pub(crate) fn into_values(self) -> Vec<String> {
        match self {
            AttrValue::Single(v) => vec![v],
            AttrValue::Multi(v) => v,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Single(v) => write!(f, "{}", v),
            AttrValue::Multi(v) => write!(f, "{}", v.join(", ")),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Single(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Single(v)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(v: Vec<String>) -> Self {
        AttrValue::Multi(v)
    }
}

impl From<Vec<&str>> for AttrValue {
    fn from(v: Vec<&str>) -> Self {
        AttrValue::Multi(v.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for AttrValue {
    fn from(v: [&str; N]) -> Self {
        AttrValue::Multi(v.iter().map(|s| s.to_string()).collect())
    }
}
