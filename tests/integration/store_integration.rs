use super::support::{db_root, new_store, put};
use kvdb::store::metadata::METADATA_FILE;
use kvdb::{ErrorKind, MetadataStore};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_resolution_is_idempotent_across_reopen() {
    let (temp, mut store) = new_store();
    let first = store.resolve("host/1").unwrap();
    let second = store.resolve("host/1").unwrap();
    assert_eq!(first, second);

    let mut reopened = MetadataStore::open(db_root(&temp)).unwrap();
    assert_eq!(reopened.resolve("host/1").unwrap(), first);
}

#[test]
fn test_independent_stores_compute_identical_paths() {
    let (temp_a, mut a) = new_store();
    let (temp_b, mut b) = new_store();

    let path_a = a.resolve("host/1").unwrap();
    let path_b = b.resolve("host/1").unwrap();

    let rel_a = path_a.strip_prefix(db_root(&temp_a)).unwrap();
    let rel_b = path_b.strip_prefix(db_root(&temp_b)).unwrap();
    assert_eq!(rel_a, rel_b);
    assert_eq!(rel_a.components().count(), 4);
}

#[test]
fn test_resolve_persists_mapping_before_save() {
    let (temp, mut store) = new_store();
    store.resolve("pending").unwrap();

    let reopened = MetadataStore::open(db_root(&temp)).unwrap();
    assert!(reopened.is_mapped("pending"));
    assert!(!reopened.exists("pending"));
    assert_eq!(reopened.list(), vec!["pending".to_string()]);
}

#[test]
fn test_list_is_sorted() {
    let (_temp, mut store) = new_store();
    for name in ["zeta", "alpha", "host/2", "host/10"] {
        put(&mut store, name, &[("k", "v")]);
    }
    assert_eq!(store.list(), vec!["alpha", "host/10", "host/2", "zeta"]);
}

#[test]
fn test_delete_unmapped_is_not_found() {
    let (_temp, mut store) = new_store();
    let err = store.delete("ghost").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_delete_removes_file_and_mapping() {
    let (temp, mut store) = new_store();
    put(&mut store, "host/1", &[("ip", "10.0.0.1")]);
    let path = store.node_path_if_mapped("host/1").unwrap();
    assert!(path.is_file());

    store.delete("host/1").unwrap();
    assert!(!path.exists());
    assert!(!store.exists("host/1"));
    assert!(!store.is_mapped("host/1"));

    let reopened = MetadataStore::open(db_root(&temp)).unwrap();
    assert!(!reopened.is_mapped("host/1"));
}

#[test]
fn test_open_without_metadata_is_not_found() {
    let temp = TempDir::new().unwrap();
    let err = MetadataStore::open(temp.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_open_rejects_corrupt_metadata() {
    let cases = [
        "not json at all",
        r#"{"version": "1", "mapping": []}"#,
        r#"{"mapping": {}}"#,
        r#"{"version": "2", "mapping": {}}"#,
    ];
    for raw in cases {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(METADATA_FILE), raw).unwrap();
        let err = MetadataStore::open(temp.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptMetadata, "case: {raw}");
    }
}

#[test]
fn test_init_twice_is_already_exists() {
    let temp = TempDir::new().unwrap();
    let root = db_root(&temp);
    MetadataStore::init(&root).unwrap();
    let err = MetadataStore::init(&root).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[test]
fn test_metadata_file_has_no_leftover_temp_files() {
    let (temp, mut store) = new_store();
    for i in 0..5 {
        store.resolve(&format!("n{i}")).unwrap();
    }
    let entries: Vec<_> = fs::read_dir(db_root(&temp))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .filter(|name| name.starts_with('.'))
        .collect();
    assert_eq!(entries, vec![METADATA_FILE.to_string()]);
}
