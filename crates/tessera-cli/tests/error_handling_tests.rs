//! Tests for error handling, exit codes and suggestions.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo;
use predicates::prelude::*;
use tempfile::TempDir;

fn tessera(dir: &Path) -> Command {
    let mut cmd = cargo::cargo_bin_cmd!("tessera");
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("TESSERA_FRAGMENTS_DIR");
    cmd
}

#[test]
fn test_unknown_fragment_is_not_found() {
    let temp = TempDir::new().unwrap();
    tessera(temp.path())
        .args(["lint", "--with", "lint/vue"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("lint config"))
        .stderr(predicate::str::contains("Fragment not found: lint/vue"))
        .stderr(predicate::str::contains("tessera fragments list"));
}

#[test]
fn test_malformed_override_path() {
    let temp = TempDir::new().unwrap();
    tessera(temp.path())
        .args(["lint", "--set", "rules.curly\\=off"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to assemble lint config"))
        .stderr(predicate::str::contains("malformed override path"))
        .stderr(predicate::str::contains("'rules.curly\\'"))
        .stderr(predicate::str::contains("\\."));
}

#[test]
fn test_set_without_value() {
    let temp = TempDir::new().unwrap();
    tessera(temp.path())
        .args(["lint", "--set", "rules.curly"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("PATH=VALUE"));
}

#[test]
fn test_overlapping_base_rules_are_rejected() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("fragments/base");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("quality.json"), r#"{"rules": {"indent": ["error", 2]}}"#).unwrap();
    fs::write(dir.join("formatting.json"), r#"{"rules": {"indent": ["error", 4]}}"#).unwrap();

    tessera(temp.path())
        .args([
            "--fragments-dir",
            "fragments",
            "lint",
            "--quality",
            "base/quality",
            "--formatting",
            "base/formatting",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("'indent' is owned by both"));
}

#[test]
fn test_concat_shape_mismatch() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.json"), r#"{"extends": "base"}"#).unwrap();
    fs::write(temp.path().join("b.json"), r#"{"extends": ["extra"]}"#).unwrap();

    tessera(temp.path())
        .args(["merge", "a.json", "b.json", "--concat", "extends"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("type conflict"))
        .stderr(predicate::str::contains("--wrap"));

    tessera(temp.path())
        .args(["merge", "a.json", "b.json", "--concat", "extends", "--wrap"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"base\""))
        .stdout(predicate::str::contains("\"extra\""));
}

#[test]
fn test_workflow_needs_a_command() {
    let temp = TempDir::new().unwrap();
    tessera(temp.path())
        .args(["workflow"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("at least one command step"));
}

#[test]
fn test_invalid_capability_is_parse_error() {
    let temp = TempDir::new().unwrap();
    tessera(temp.path())
        .args(["workflow", "--capability", "admin", "--run", "make"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("admin"));
}

#[test]
fn test_toml_cannot_hold_null() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.json"), r#"{"key": null}"#).unwrap();

    tessera(temp.path())
        .args(["merge", "a.json", "--out", "out.toml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("out.toml"));
    assert!(!temp.path().join("out.toml").exists());
}

#[test]
fn test_unknown_output_extension() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.json"), r#"{"key": 1}"#).unwrap();

    tessera(temp.path())
        .args(["merge", "a.json", "--out", "out.ini"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown artifact format"));
}

#[test]
fn test_out_cannot_escape_directory() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.json"), r#"{"key": 1}"#).unwrap();

    tessera(temp.path())
        .args(["merge", "a.json", "--out", "../a.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(".."));
}

#[test]
fn test_missing_input_file() {
    let temp = TempDir::new().unwrap();
    tessera(temp.path())
        .args(["merge", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.json"));
}

#[test]
fn test_missing_explicit_config_file() {
    let temp = TempDir::new().unwrap();
    tessera(temp.path())
        .args(["--config", "nope.toml", "fragments", "list"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_unknown_config_key() {
    let temp = TempDir::new().unwrap();
    tessera(temp.path())
        .args(["config", "get", "defaults.lang"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown config key"))
        .stderr(predicate::str::contains("tessera config list"));
}

#[test]
fn test_verbose_shows_causes() {
    let temp = TempDir::new().unwrap();
    tessera(temp.path())
        .args(["config", "get", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--verbose"));

    tessera(temp.path())
        .args(["-v", "config", "get", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--verbose").not());
}
