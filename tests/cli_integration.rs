// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Integration tests for the `intwc` command-line harness.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Runs `intwc` isolated from the user's config directory.
fn intwc(home: &Path, args: &[&str]) -> Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_intwc"))
        .args(args)
        .env("XDG_CONFIG_HOME", home)
        .env_remove("INTWC_LINT__MAX_LINE_LENGTH")
        .output()
        .context("Failed to spawn intwc")
}

fn write(dir: &TempDir, name: &str, content: &str) -> Result<String> {
    let path = dir.path().join(name);
    std::fs::write(&path, content).with_context(|| format!("Failed to write {name}"))?;
    path.to_str()
        .map(str::to_string)
        .context("temp path is not UTF-8")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_check_clean_file_succeeds() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let file = write(&dir, "clean.txt", "all good\n")?;

    let output = intwc(dir.path(), &["check", &file, "--nocolor"])?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout(&output).trim(), "1 file checked, 0 problems (0 errors)");
    Ok(())
}

#[test]
fn test_check_reports_warnings_without_failing() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let file = write(&dir, "notes.txt", "hello \n")?;

    let output = intwc(dir.path(), &["check", &file, "--nocolor"])?;
    assert!(output.status.success());

    let text = stdout(&output);
    let expected = format!(
        "{file}:1:6 warning [lint/whitespace] Trailing whitespace (trailing-whitespace)"
    );
    assert!(text.lines().any(|line| line == expected), "stdout: {text}");
    assert!(text.contains("1 problem (0 errors)"));
    Ok(())
}

#[test]
fn test_check_fails_on_error_markers() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let clean = write(&dir, "clean.txt", "fine\n")?;
    let conflicted = write(&dir, "merge.md", "<<<<<<< HEAD\na\n=======\nb\n>>>>>>> topic\n")?;

    let output = intwc(dir.path(), &["check", &clean, &conflicted, "--nocolor"])?;
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("2 files checked, 3 problems (3 errors)"));
    Ok(())
}

#[test]
fn test_check_json_report() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let file = write(&dir, "todo.log", "\tTODO: ship it\n")?;

    let output = intwc(dir.path(), &["check", &file, "--json"])?;
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).context("Invalid JSON report")?;
    let entry = &report[0];
    assert_eq!(entry["path"], Value::String(file));
    assert_eq!(entry["language"], "plaintext-lint");

    let markers = entry["markers"].as_array().context("markers is not an array")?;
    let owners: Vec<&str> = markers
        .iter()
        .filter_map(|marker| marker["owner"].as_str())
        .collect();
    assert!(owners.contains(&"lint/whitespace"));
    assert!(owners.contains(&"lint/style"));
    assert!(markers.iter().all(|marker| marker["source"] == "intwc-lint"));
    assert!(markers.iter().all(|marker| marker["range"]["start"]["line"] == 0));
    Ok(())
}

#[test]
fn test_max_line_length_flag_overrides_config() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let file = write(&dir, "long.txt", "0123456789\n")?;

    let output = intwc(dir.path(), &["check", &file, "--nocolor"])?;
    assert!(stdout(&output).contains("0 problems"));

    let output = intwc(
        dir.path(),
        &["check", &file, "--nocolor", "--max-line-length", "8"],
    )?;
    let text = stdout(&output);
    assert!(
        text.contains(":1:9 warning [lint/style] Line is 10 characters long (limit 8)"),
        "stdout: {text}"
    );
    Ok(())
}

#[test]
fn test_check_unknown_extension_has_no_providers() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let file = write(&dir, "main.rs", "fn main() {}   \n")?;

    let output = intwc(dir.path(), &["check", &file, "--json"])?;
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report[0]["language"], "plaintext");
    assert_eq!(report[0]["markers"], Value::Array(Vec::new()));

    // Forcing the language runs the lint providers anyway
    let output = intwc(
        dir.path(),
        &["check", &file, "--json", "--language", "plaintext-lint"],
    )?;
    let report: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report[0]["markers"][0]["code"], "trailing-whitespace");
    Ok(())
}

#[test]
fn test_check_missing_file_fails() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("missing.txt");
    let missing = missing.to_str().context("temp path is not UTF-8")?;

    let output = intwc(dir.path(), &["check", missing])?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read"));
    Ok(())
}

#[test]
fn test_languages_lists_lint_language() -> Result<()> {
    let dir = tempfile::tempdir()?;

    let output = intwc(dir.path(), &["languages", "--json"])?;
    assert!(output.status.success());
    let languages: Value = serde_json::from_slice(&output.stdout)?;
    let lint = &languages[0];
    assert_eq!(lint["id"], "plaintext-lint");
    assert_eq!(lint["extensions"], serde_json::json!(["txt", "md", "log"]));
    assert_eq!(lint["capabilities"], serde_json::json!(["configuration", "diagnostics"]));
    assert_eq!(
        lint["diagnostic_owners"],
        serde_json::json!(["lint/whitespace", "lint/style"])
    );

    let output = intwc(dir.path(), &["languages", "--nocolor"])?;
    let text = stdout(&output);
    assert!(text.starts_with("LANGUAGE"));
    assert!(text.lines().any(|line| line.starts_with("plaintext-lint")));
    Ok(())
}

#[test]
fn test_version_flag() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = intwc(dir.path(), &["--version"])?;
    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}
