//! Command-line behaviour of the generator binary

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn codegen() -> Command {
    Command::cargo_bin("lazyconvex-codegen").unwrap()
}

#[test]
fn test_missing_required_flags_print_usage() {
    codegen()
        .arg("--schema")
        .arg("schema.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--convex"))
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_generates_and_prints_summary() {
    let dir = tempfile::tempdir().unwrap();
    let convex = dir.path().join("convex");
    fs::create_dir(&convex).unwrap();
    fs::write(
        convex.join("note.ts"),
        "export const { create, list, rm } = crud('note', owned.note)\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("schema.json"),
        r#"{"owned": {"note": {"type": "object", "shape": {"text": {"type": "string"}}}}}"#,
    )
    .unwrap();
    let output = dir.path().join("Api.swift");

    codegen()
        .arg("--schema")
        .arg(dir.path().join("schema.json"))
        .arg("--convex")
        .arg(&convex)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Generated "))
        .stdout(predicate::str::contains(
            "1 structs, 0 enums, 1 modules, 3 API constants, 3 typed wrappers, 1 Where structs",
        ));

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains("public enum NoteAPI {"));
    assert!(text.contains("public static func listArgs("));
}

#[test]
fn test_missing_schema_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("Api.swift");

    codegen()
        .arg("--schema")
        .arg(dir.path().join("absent.json"))
        .arg("--convex")
        .arg(dir.path())
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("schema file not found"));

    assert!(!output.exists());
}
