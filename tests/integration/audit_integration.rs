use super::support::{new_store, put};
use kvdb::audit::{AuditEngine, SchemaConfig, SCHEMA_FILE};
use kvdb::ErrorKind;
use std::collections::BTreeMap;
use std::fs;

#[test]
fn test_required_keys_by_pattern() {
    let (_temp, mut store) = new_store();
    put(&mut store, "test/foo", &[("t1", "x")]);
    put(&mut store, "test1/foo", &[("t1", "x")]);

    let mut schema = SchemaConfig::new();
    schema.required("t1", &[]).unwrap();
    schema.nodes("test/.*").unwrap().required("t2", &[]).unwrap();

    let report = AuditEngine::new(schema).audit(&mut store);
    let expected = BTreeMap::from([(
        "test/foo".to_string(),
        vec!["t2: missing required key".to_string()],
    )]);
    assert_eq!(report, expected);
}

#[test]
fn test_reference_validator_messages() {
    let (_temp, mut store) = new_store();
    put(&mut store, "a", &[("k", "v")]);
    put(&mut store, "other", &[("k", "v")]);
    put(&mut store, "good", &[("t1", "%other")]);
    put(&mut store, "bad", &[("t1", "%a"), ("t1", "invalid")]);
    put(&mut store, "dangling", &[("t1", "%missing")]);

    let mut schema = SchemaConfig::new();
    schema.optional("t1", &["reference"]).unwrap();

    let report = AuditEngine::new(schema).audit(&mut store);
    assert!(!report.contains_key("good"));
    assert_eq!(
        report["bad"],
        vec![r#"t1: ["%a", "invalid"]: invalid reference"#.to_string()]
    );
    assert_eq!(
        report["dangling"],
        vec![r#"t1: "%missing": invalid reference"#.to_string()]
    );
}

#[test]
fn test_reference_to_mapped_but_unsaved_node_fails() {
    let (_temp, mut store) = new_store();
    store.resolve("placeholder").unwrap();
    put(&mut store, "n", &[("t1", "%placeholder")]);

    let mut schema = SchemaConfig::new();
    schema.optional("t1", &["reference"]).unwrap();
    let report = AuditEngine::new(schema).audit(&mut store);
    assert_eq!(report["n"].len(), 1);
}

#[test]
fn test_validators_concatenate_across_patterns() {
    let (_temp, mut store) = new_store();
    put(&mut store, "host/1", &[("ip", "a"), ("ip", "b")]);

    let mut schema = SchemaConfig::new();
    schema.required("ip", &["single_value"]).unwrap();
    schema
        .nodes("^host/")
        .unwrap()
        .validate("ip", "must be numeric", |value, _, _| {
            value
                .values()
                .iter()
                .all(|v| v.chars().all(|c| c.is_ascii_digit() || c == '.'))
        });

    let report = AuditEngine::new(schema).audit(&mut store);
    assert_eq!(
        report["host/1"],
        vec![
            r#"ip: ["a", "b"]: must be a single value"#.to_string(),
            r#"ip: ["a", "b"]: must be numeric"#.to_string(),
        ]
    );
}

#[test]
fn test_validators_skip_absent_values() {
    let (_temp, mut store) = new_store();
    put(&mut store, "n", &[("other", "x")]);

    let mut schema = SchemaConfig::new();
    schema
        .validate("missing", "never called", |_, _, _| panic!("invoked"))
        .unwrap();
    assert!(AuditEngine::new(schema).audit(&mut store).is_empty());
}

#[test]
fn test_empty_schema_always_passes() {
    let (_temp, mut store) = new_store();
    put(&mut store, "n", &[("k", "v")]);
    let engine = AuditEngine::for_store(&store).unwrap();
    assert!(engine.config().is_empty());
    assert!(engine.audit(&mut store).is_empty());
}

#[test]
fn test_schema_file_is_loaded_from_root() {
    let (_temp, mut store) = new_store();
    put(&mut store, "host/1", &[("ip", "10.0.0.1")]);
    put(&mut store, "host/2", &[("ip", "bogus")]);
    put(&mut store, "group/a", &[("member", "%host/1")]);

    fs::write(
        store.root().join(SCHEMA_FILE),
        r#"
[[nodes]]
pattern = "^host/"
required = { ip = ["single_value", { reason = "must be dotted quad", matches = '^\d+\.\d+\.\d+\.\d+$' }] }

[[nodes]]
pattern = "^group/"
required = { member = ["reference"], owner = [] }
"#,
    )
    .unwrap();

    let report = AuditEngine::for_store(&store).unwrap().audit(&mut store);
    assert_eq!(report.len(), 2);
    assert_eq!(
        report["host/2"],
        vec![r#"ip: "bogus": must be dotted quad"#.to_string()]
    );
    assert_eq!(
        report["group/a"],
        vec!["owner: missing required key".to_string()]
    );
}

#[test]
fn test_unknown_builtin_in_schema_file_fails_construction() {
    let (_temp, store) = new_store();
    fs::write(
        store.root().join(SCHEMA_FILE),
        "required = { k = [\"no_such_check\"] }\n",
    )
    .unwrap();
    let err = AuditEngine::for_store(&store).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn test_audit_sees_unsaved_cached_edits() {
    let (_temp, mut store) = new_store();
    put(&mut store, "n", &[("k", "v")]);
    store.node("n").unwrap().delete("k");

    let mut schema = SchemaConfig::new();
    schema.required("k", &[]).unwrap();
    let report = AuditEngine::new(schema).audit(&mut store);
    assert_eq!(report["n"], vec!["k: missing required key".to_string()]);
}
