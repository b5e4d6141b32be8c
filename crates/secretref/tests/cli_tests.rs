//! End-to-end tests for the secretref binary
//!
//! Only offline paths are exercised: argument parsing, plain passthrough,
//! configuration loading and provider setup failures. Nothing here needs a
//! bws binary or network access.

use std::process::{Command, Output};
use tempfile::TempDir;

fn secretref(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_secretref"))
        .args(args)
        .current_dir(dir.path())
        .env_remove("BWS_ACCESS_TOKEN")
        .env_remove("BWS_ORG_ID")
        .env_remove("BWS_SERVER_URL")
        .output()
        .expect("failed to run secretref")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_resolve_plain_values_pass_through() {
    let dir = TempDir::new().unwrap();
    let output = secretref(&dir, &["resolve", "plain-value", "another"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "plain-value\nanother\n");
}

#[test]
fn test_resolve_plain_values_as_json() {
    let dir = TempDir::new().unwrap();
    let output = secretref(&dir, &["resolve", "--json", "plain-value"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["plain-value"], "plain-value");
}

#[test]
fn test_resolve_without_token_fails_setup() {
    let dir = TempDir::new().unwrap();
    let output = secretref(&dir, &["resolve", "secretref:bws:project/dotenv/key/TOKEN"]);

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("access token is required"), "stderr: {}", err);
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_resolve_with_missing_config_file() {
    let dir = TempDir::new().unwrap();
    let output = secretref(
        &dir,
        &["--config", "missing.yaml", "resolve", "secretref:bws:abc"],
    );

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Configuration file not found"));
}

#[test]
fn test_check_reports_schemes() {
    let dir = TempDir::new().unwrap();
    let output = secretref(
        &dir,
        &[
            "check",
            "--json",
            "secretref:bws:project/dotenv/key/TOKEN",
            "secretref:bws:be8e0ad8-d545-4017-a55a-b02f014d4158",
        ],
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json[0]["scheme"], "project-key");
    assert_eq!(json[0]["project"], "dotenv");
    assert_eq!(json[0]["key"], "TOKEN");
    assert_eq!(json[1]["scheme"], "secret-id");
}

#[test]
fn test_check_human_report_stays_on_stderr() {
    let dir = TempDir::new().unwrap();
    let output = secretref(&dir, &["check", "secretref:bws:project/dotenv/key/TOKEN"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty(), "stdout: {}", stdout(&output));
    let err = stderr(&output);
    assert!(err.contains("project-key"), "stderr: {}", err);
    assert!(err.contains("dotenv"), "stderr: {}", err);
}

#[test]
fn test_check_fails_on_invalid_reference() {
    let dir = TempDir::new().unwrap();
    let output = secretref(&dir, &["check", "secretref:bws:", "secretref:bws:abc"]);

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("bws ref is empty"), "stderr: {}", err);
    assert!(err.contains("1 of 2 references are invalid"), "stderr: {}", err);
}

#[test]
fn test_providers_marks_configured() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("secretref.yaml"),
        "providers:\n  bws:\n    organization_id: org\n    cache_ttl: 5m\n",
    )
    .unwrap();

    let output = secretref(&dir, &["providers", "--json"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json[0]["name"], "bws");
    assert_eq!(json[0]["configured"], true);
}

#[test]
fn test_providers_without_config() {
    let dir = TempDir::new().unwrap();
    let output = secretref(&dir, &["providers"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("bws"));
    assert!(out.contains("environment defaults"));
}
