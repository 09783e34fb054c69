use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use sudo_context_store::{Operation, OperationOutput};
use tempfile::TempDir;

mod support;

use support::FakeInspector;

fn run(name: &str, args: Value, inspector: &FakeInspector) -> Value {
    let op = Operation::parse(name, &args).expect("parse");
    assert_eq!(op.name().as_str(), name);
    let output = op.execute(inspector).expect("execute");
    serde_json::to_value(output).expect("serialize output")
}

#[test]
fn upsert_query_and_status_through_dispatch() {
    let temp = TempDir::new().expect("tempdir");
    let root = temp.path().to_string_lossy().to_string();
    std::fs::create_dir_all(temp.path().join("src")).unwrap();
    let inspector = FakeInspector::tracking(&["src/main.rs", "docs/readme.md"])
        .changed_since("abc123", "src");

    let upserted = run(
        "upsert_context",
        json!({
            "project_root": root,
            "repo": "owner/repo",
            "git_ref": "abc123",
            "directory": "src",
            "sections": {"summary": "x", "notes": "y"}
        }),
        &inspector,
    );
    assert_eq!(upserted["status"], "ok");
    let path = upserted["path"].as_str().expect("path");
    assert!(path.ends_with("src/context.json"), "{path}");

    let queried = run(
        "query_context",
        json!({"project_root": root, "directory": "src", "sections": ["summary"]}),
        &inspector,
    );
    assert_eq!(queried["sections"], json!({"summary": "x"}));
    assert_eq!(queried["git_ref"], "abc123");
    assert_eq!(queried["directory"], "src");

    let status = run(
        "check_context_status",
        json!({"project_root": root}),
        &inspector,
    );
    assert_eq!(
        status,
        json!({
            "needs_creation": [".", "docs"],
            "needs_deletion": [],
            "needs_update": ["src"]
        })
    );
}

#[test]
fn query_for_unknown_directory_reports_not_found() {
    let temp = TempDir::new().expect("tempdir");
    let op = Operation::parse(
        "query_context",
        &json!({"project_root": temp.path(), "directory": "nowhere"}),
    )
    .expect("parse");
    let err = op.execute(&FakeInspector::default()).unwrap_err();
    assert_eq!(err.code(), "not_found");
    assert!(err.is_caller_error());
    assert_eq!(err.to_string(), "No context found for directory: nowhere");
}

#[test]
fn outputs_serialize_without_variant_tags() {
    let temp = TempDir::new().expect("tempdir");
    let op = Operation::parse(
        "check_context_status",
        &json!({"project_root": temp.path()}),
    )
    .expect("parse");
    let output = op.execute(&FakeInspector::default()).expect("execute");
    assert!(matches!(output, OperationOutput::Status(_)));
    let value = serde_json::to_value(&output).unwrap();
    assert!(value.get("needs_creation").is_some(), "{value}");
}
