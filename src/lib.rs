//! KVDB: Filesystem-Backed Key/Value Database
//!
//! Nodes are named records of multi-valued `key: value` attributes, each
//! stored in its own plain-text file under a deterministic, sharded path.
//! A metadata file maps names to paths, key paths address values, and a
//! pattern-based schema audits every node.

pub mod audit;
pub mod config;
pub mod error;
pub mod keypath;
pub mod logging;
pub mod node;
pub mod store;
pub mod tooling;
pub mod types;

pub use audit::{AuditEngine, AuditReport, SchemaConfig, Validator};
pub use error::{ApiError, ErrorKind, StorageError};
pub use keypath::{expand, KeyPath};
pub use node::{AttributeMap, NodeRecord};
pub use store::MetadataStore;
pub use types::AttrValue;
