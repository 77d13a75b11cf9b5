use clap::Parser;
use kvdb::config::KvConfig;
use kvdb::tooling::cli::{Cli, CliContext, Commands};
use kvdb::{ErrorKind, MetadataStore};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn context(temp: &TempDir) -> CliContext {
    CliContext::with_config(Some(temp.path().join("db")), KvConfig::default())
}

fn run(ctx: &CliContext, args: &[&str]) -> Result<String, kvdb::ApiError> {
    let mut argv = vec!["kv"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    ctx.execute(&cli.command)
}

fn datafile(temp: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = temp.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn parse_valid_command_matrix() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["kv", "init"],
        vec!["kv", "-d", "/tmp/db", "list"],
        vec!["kv", "list", "-p", "^host/"],
        vec!["kv", "nodepath", "host/1"],
        vec!["kv", "print", "-v", "host/1#ip"],
        vec!["kv", "set", "-c", "-a", "host/1", "data.txt"],
        vec!["kv", "set", "-f", "data.txt"],
        vec!["kv", "import", "host/1"],
        vec!["kv", "cp", "a", "b"],
        vec!["kv", "rm", "a"],
        vec!["kv", "audit", "--format", "json"],
        vec!["kv", "--log-level", "debug", "audit"],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_ok(), "expected valid parse for args: {args:?}");
    }
}

#[test]
fn parse_rejects_bad_arity_and_formats() {
    assert!(Cli::try_parse_from(["kv", "nodepath"]).is_err());
    assert!(Cli::try_parse_from(["kv", "cp", "only-one"]).is_err());
    assert!(Cli::try_parse_from(["kv", "print", "a", "b"]).is_err());
    assert!(Cli::try_parse_from(["kv", "audit", "--format", "xml"]).is_err());
    assert!(Cli::try_parse_from(["kv", "edit", "a"]).is_err());
}

#[test]
fn init_then_reinit_fails() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp);
    assert_eq!(run(&ctx, &["init"]).unwrap(), "");
    let err = run(&ctx, &["init"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[test]
fn import_print_and_list() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp);
    run(&ctx, &["init"]).unwrap();

    let data = datafile(&temp, "host.txt", "ip: 10.0.0.1\nalias: web\nalias: www\n");
    run(&ctx, &["import", "host/1", arg(&data)]).unwrap();

    assert_eq!(run(&ctx, &["print", "host/1#ip"]).unwrap(), "10.0.0.1");
    assert_eq!(
        run(&ctx, &["print", "host/1"]).unwrap(),
        "host/1#alias#0: web\nhost/1#alias#1: www\nhost/1#ip: 10.0.0.1"
    );
    assert_eq!(run(&ctx, &["list"]).unwrap(), "host/1");

    let listed = run(&ctx, &["list", "-p"]).unwrap();
    let store = MetadataStore::open(temp.path().join("db")).unwrap();
    let path = store.node_path_if_mapped("host/1").unwrap();
    assert_eq!(listed, format!("host/1 {}", path.display()));
    assert_eq!(
        run(&ctx, &["nodepath", "host/1"]).unwrap(),
        path.display().to_string()
    );

    let err = run(&ctx, &["import", "host/1", arg(&data)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[test]
fn list_filters_by_regexp() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp);
    run(&ctx, &["init"]).unwrap();
    let data = datafile(&temp, "d.txt", "k: v\n");
    for node in ["host/1", "host/2", "group/a"] {
        run(&ctx, &["import", node, arg(&data)]).unwrap();
    }
    assert_eq!(run(&ctx, &["list", "^host/"]).unwrap(), "host/1\nhost/2");

    let err = run(&ctx, &["list", "("]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn set_requires_create_for_new_nodes() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp);
    run(&ctx, &["init"]).unwrap();
    let data = datafile(&temp, "d.txt", "k: v\n");

    let err = run(&ctx, &["set", "n", arg(&data)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    run(&ctx, &["set", "-c", "n", arg(&data)]).unwrap();
    assert_eq!(run(&ctx, &["print", "n#k"]).unwrap(), "v");
}

#[test]
fn set_replaces_unless_appending() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp);
    run(&ctx, &["init"]).unwrap();
    run(&ctx, &["import", "n", arg(&datafile(&temp, "a.txt", "k: one\nkeep: me\n"))]).unwrap();

    let two = datafile(&temp, "b.txt", "k: two\n");
    run(&ctx, &["set", "n", arg(&two)]).unwrap();
    assert_eq!(run(&ctx, &["print", "n#k"]).unwrap(), "two");
    assert_eq!(run(&ctx, &["print", "n#keep"]).unwrap(), "me");

    let three = datafile(&temp, "c.txt", "k: three\n");
    run(&ctx, &["set", "-a", "n", arg(&three)]).unwrap();
    assert_eq!(run(&ctx, &["print", "n#k"]).unwrap(), "three\ntwo");
}

#[test]
fn set_full_is_all_or_nothing() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp);
    run(&ctx, &["init"]).unwrap();
    run(&ctx, &["import", "a", arg(&datafile(&temp, "a.txt", "k: old\n"))]).unwrap();

    let batch = datafile(&temp, "full.txt", "a#k: new\nb#k: fresh\n");
    let err = run(&ctx, &["set", "-f", arg(&batch)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(run(&ctx, &["print", "a#k"]).unwrap(), "old");

    run(&ctx, &["set", "-f", "-c", arg(&batch)]).unwrap();
    assert_eq!(run(&ctx, &["print", "a#k"]).unwrap(), "new");
    assert_eq!(run(&ctx, &["print", "b#k"]).unwrap(), "fresh");
}

#[test]
fn set_rejects_missing_datafile_and_extra_args() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp);
    run(&ctx, &["init"]).unwrap();

    let missing = temp.path().join("nope.txt");
    let err = run(&ctx, &["set", "-c", "n", arg(&missing)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = run(&ctx, &["set", "-c", "n", "a", "b"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = run(&ctx, &["set"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn cp_and_rm() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp);
    run(&ctx, &["init"]).unwrap();
    run(&ctx, &["import", "src", arg(&datafile(&temp, "s.txt", "k: a\nk: b\n"))]).unwrap();

    run(&ctx, &["cp", "src", "dst"]).unwrap();
    assert_eq!(run(&ctx, &["print", "dst#k"]).unwrap(), "a\nb");
    assert_eq!(
        run(&ctx, &["cp", "src", "dst"]).unwrap_err().kind(),
        ErrorKind::AlreadyExists
    );
    assert_eq!(
        run(&ctx, &["cp", "ghost", "x"]).unwrap_err().kind(),
        ErrorKind::NotFound
    );

    run(&ctx, &["rm", "src"]).unwrap();
    assert_eq!(run(&ctx, &["list"]).unwrap(), "dst");
    assert_eq!(
        run(&ctx, &["rm", "src"]).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        run(&ctx, &["nodepath", "src"]).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn audit_text_and_json() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp);
    run(&ctx, &["init"]).unwrap();
    run(&ctx, &["import", "n", arg(&datafile(&temp, "n.txt", "k: v\n"))]).unwrap();

    assert_eq!(run(&ctx, &["audit"]).unwrap(), "");

    fs::write(temp.path().join("db").join("schema.toml"), "required = { owner = [] }\n").unwrap();
    assert_eq!(
        run(&ctx, &["audit"]).unwrap(),
        "n: owner: missing required key"
    );

    let json = run(&ctx, &["audit", "--format", "json"]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["n"][0], "owner: missing required key");
}

#[test]
fn commands_without_database_fail_with_config_error() {
    if std::env::var(kvdb::config::DATABASE_ENV).is_ok() {
        return;
    }
    let ctx = CliContext::with_config(None, KvConfig::default());
    let cli = Cli::try_parse_from(["kv", "list"]).unwrap();
    assert!(matches!(cli.command, Commands::List { .. }));
    let err = ctx.execute(&cli.command).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}
