//! Integration tests for configuration layering.
//!
//! Tests the priority chain: hardcoded defaults < XDG config < project config < CLI args

#![allow(clippy::unwrap_used)] // Test code uses unwrap for brevity
#![allow(deprecated)] // cargo_bin deprecation warning

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use microsleep_test_support::SyntheticImageBuilder;
use predicates::prelude::*;
use serde_json::Value;

/// Command rooted in `home`, with XDG lookups pointed inside it.
fn microsleep(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("microsleep").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .current_dir(home);
    cmd
}

fn write_xdg_config(home: &Path, content: &str) {
    let dir = home.join("config").join("microsleep");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), content).unwrap();
}

fn write_image(dir: &Path, name: &str) {
    fs::write(dir.join(name), SyntheticImageBuilder::uniform_gray(32, 32, 128)).unwrap();
}

#[test]
fn test_project_config_applies_format() {
    let home = tempfile::tempdir().unwrap();
    fs::write(home.path().join(".microsleep.toml"), "[output]\nformat = 'json'\n").unwrap();
    write_image(home.path(), "face.png");

    let output = microsleep(home.path()).arg("face.png").output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    let value: Value = serde_json::from_str(stdout.trim()).unwrap();
    assert!(value.is_array(), "expected JSON array, got: {stdout}");
}

#[test]
fn test_cli_format_overrides_project_config() {
    let home = tempfile::tempdir().unwrap();
    fs::write(home.path().join(".microsleep.toml"), "[output]\nformat = 'json'\n").unwrap();
    write_image(home.path(), "face.png");

    let output = microsleep(home.path())
        .args(["--format", "jsonl", "face.png"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    let value: Value = serde_json::from_str(stdout.lines().next().unwrap()).unwrap();
    assert!(value.is_object());
}

#[test]
fn test_project_config_overrides_xdg() {
    let home = tempfile::tempdir().unwrap();
    write_xdg_config(home.path(), "[models]\ndir = '/xdg/models'\n");
    fs::write(
        home.path().join(".microsleep.toml"),
        "[models]\ndir = '/project/models'\n",
    )
    .unwrap();

    microsleep(home.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/project/models"));
}

#[test]
fn test_xdg_config_applies_without_project_file() {
    let home = tempfile::tempdir().unwrap();
    write_xdg_config(home.path(), "[models]\ndir = '/xdg/models'\n");

    microsleep(home.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/xdg/models"));
}

#[test]
fn test_project_config_found_in_parent() {
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join(".microsleep.toml"),
        "[models]\ndir = '/parent/models'\n",
    )
    .unwrap();
    let nested = home.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();

    let mut cmd = microsleep(home.path());
    cmd.current_dir(&nested)
        .args(["models", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/parent/models"));
}

#[test]
fn test_invalid_config_value_fails() {
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join(".microsleep.toml"),
        "[detector]\nmin_presence = 1.5\n",
    )
    .unwrap();

    microsleep(home.path())
        .args(["models", "path"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("detector.min_presence"));
}

#[test]
fn test_malformed_config_is_ignored() {
    let home = tempfile::tempdir().unwrap();
    fs::write(home.path().join(".microsleep.toml"), "not = [valid").unwrap();

    microsleep(home.path())
        .args(["models", "path"])
        .assert()
        .success();
}
