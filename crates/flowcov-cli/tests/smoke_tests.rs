//! Smoke tests for the flowcov CLI
//!
//! These tests run the binary against the fixtures in `testdata/`.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get a command for the flowcov binary
fn flowcov() -> Command {
    let mut cmd = Command::cargo_bin("flowcov").expect("flowcov binary should exist");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn testdata(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name)
}

/// Replay the sample trace into `dir` and return the report path
fn replay_into(dir: &TempDir) -> PathBuf {
    flowcov()
        .arg("replay")
        .arg("--models")
        .arg(testdata("models.yaml"))
        .arg("--trace")
        .arg(testdata("trace.yaml"))
        .arg("--out")
        .arg(dir.path())
        .assert()
        .success();
    dir.path().join("OrderTest").join("flowCovReport.json")
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    flowcov()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_flag() {
    flowcov()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("replay"))
        .stdout(predicate::str::contains("summary"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_no_args_shows_help() {
    flowcov().assert().failure();
}

// ============================================================================
// Replay
// ============================================================================

#[test]
fn test_replay_writes_report() {
    let dir = TempDir::new().unwrap();
    flowcov()
        .args(["--color", "never", "replay"])
        .arg("--models")
        .arg(testdata("models.yaml"))
        .arg("--trace")
        .arg(testdata("trace.yaml"))
        .arg("--out")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Coverage OrderTest: 100.0%"))
        .stdout(predicate::str::contains("dish (dish.dmn): 25.0%"));

    let report = dir.path().join("OrderTest").join("flowCovReport.json");
    let text = std::fs::read_to_string(report).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["name"], "OrderTest");
    assert_eq!(json["process_models"][0]["total_element_count"], 5);
    assert_eq!(
        json["process_models"][0]["test_classes"][0]["test_methods"]
            .as_array()
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn test_replay_quiet_prints_nothing() {
    let dir = TempDir::new().unwrap();
    flowcov()
        .arg("-q")
        .arg("replay")
        .arg("--models")
        .arg(testdata("models.yaml"))
        .arg("--trace")
        .arg(testdata("trace.yaml"))
        .arg("--out")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_replay_minimum_failure_still_writes_report() {
    let dir = TempDir::new().unwrap();
    flowcov()
        .arg("replay")
        .arg("--models")
        .arg(testdata("models.yaml"))
        .arg("--trace")
        .arg(testdata("trace.yaml"))
        .arg("--config")
        .arg(testdata("strict.yaml"))
        .arg("--out")
        .arg(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("starts_order"));
    assert!(dir.path().join("OrderTest").join("flowCovReport.json").exists());
}

#[test]
fn test_replay_missing_models_fails() {
    flowcov()
        .args(["replay", "--models", "does-not-exist.yaml", "--trace"])
        .arg(testdata("trace.yaml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("I/O"));
}

// ============================================================================
// Summary and check
// ============================================================================

#[test]
fn test_summary_text() {
    let dir = TempDir::new().unwrap();
    let report = replay_into(&dir);
    flowcov()
        .args(["-v", "--color", "never", "summary"])
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("order (order.bpmn): 100.0%"))
        .stdout(predicate::str::contains("OrderTest::starts_order: 20.0%"));
}

#[test]
fn test_summary_json() {
    let dir = TempDir::new().unwrap();
    let report = replay_into(&dir);
    let output = flowcov()
        .arg("summary")
        .arg(&report)
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["name"], "OrderTest");
    assert_eq!(json["processes"][0]["key"], "order");
    assert_eq!(json["decisions"][0]["coverage"], 0.25);
}

#[test]
fn test_check_passes() {
    let dir = TempDir::new().unwrap();
    let report = replay_into(&dir);
    flowcov()
        .args(["--color", "never", "check"])
        .arg(&report)
        .args(["--min", "0.9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PASS"));
}

#[test]
fn test_check_fails_below_minimum() {
    let dir = TempDir::new().unwrap();
    let report = replay_into(&dir);
    flowcov()
        .args(["--color", "never", "check"])
        .arg(&report)
        .args(["--min", "0.5", "--definition", "dish"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("FAIL decision dish"));
}

#[test]
fn test_check_rejects_out_of_range_minimum() {
    let dir = TempDir::new().unwrap();
    let report = replay_into(&dir);
    flowcov()
        .arg("check")
        .arg(&report)
        .args(["--min", "1.5"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid argument: --min 1.5"));
}
