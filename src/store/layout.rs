//! Deterministic on-disk placement of node files.

use std::path::PathBuf;
use uuid::Uuid;

/// Number of single-character shard directories above each node file
pub const SHARD_DEPTH: usize = 3;

/// Compute the stable identifier of a node name
///
/// Name-based UUID (v5, SHA-1) in the OID namespace, so every store computes
/// the same id for the same name without coordination.
pub fn node_hash(name: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

/// Relative path of a node's file: `<h0>/<h1>/<h2>/<hash>`
pub fn node_relative_path(name: &str) -> PathBuf {
    let hash = node_hash(name);
    let mut path = PathBuf::new();
    // hyphenated UUIDs are ASCII, so byte slicing is char slicing
    for i in 0..SHARD_DEPTH {
        path.push(&hash[i..i + 1]);
    }
    path.push(&hash);
    path
}
