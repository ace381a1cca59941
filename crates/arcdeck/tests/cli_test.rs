//! Integration tests for the `arcdeck` binary.
//!
//! Every test points config and state at a temp directory, so nothing
//! touches the user's real files or a live controller.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

const CONTROLLER_ID: &str = "6f1c2b7e-4a1d-4c55-9a3e-1f0d9b1e2a33";

/// `arcdeck` with config and state isolated under `dir`.
fn arcdeck_cmd(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("arcdeck");
    cmd.env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join("xdg-config"))
        .env("XDG_DATA_HOME", dir.join("xdg-data"))
        .env("ARCDECK_CONFIG", dir.join("config.toml"))
        .env("ARCDECK_STATE", dir.join("controllers.toml"))
        .env_remove("RUST_LOG");
    cmd
}

/// Seed the state file with one controller that does not remember its
/// password, so no keyring is consulted.
fn seed_state(dir: &Path) {
    std::fs::write(
        dir.join("controllers.toml"),
        format!(
            "[[controllers]]\n\
             id = \"{CONTROLLER_ID}\"\n\
             url = \"https://127.0.0.1:9/\"\n\
             namespace = \"arc\"\n\
             username = \"admin\"\n\
             rememberPassword = false\n\
             name = \"east\"\n"
        ),
    )
    .unwrap();
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let dir = TempDir::new().unwrap();
    let output = arcdeck_cmd(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    arcdeck_cmd(dir.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("data controllers")
            .and(predicate::str::contains("add"))
            .and(predicate::str::contains("refresh"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    arcdeck_cmd(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("arcdeck"));
}

// ── Controller list ─────────────────────────────────────────────────

#[test]
fn test_list_empty_state() {
    let dir = TempDir::new().unwrap();
    arcdeck_cmd(dir.path())
        .arg("list")
        .assert()
        .success()
        .stderr(predicate::str::contains("No controllers yet"));
}

#[test]
fn test_list_empty_state_json() {
    let dir = TempDir::new().unwrap();
    arcdeck_cmd(dir.path())
        .args(["list", "-o", "json-compact"])
        .assert()
        .success()
        .stdout(predicate::str::diff("[]\n"));
}

#[test]
fn test_list_saved_controller() {
    let dir = TempDir::new().unwrap();
    seed_state(dir.path());

    arcdeck_cmd(dir.path())
        .args(["list", "--color", "never"])
        .assert()
        .success()
        .stdout(predicate::str::contains("east").and(predicate::str::contains("arc")));

    arcdeck_cmd(dir.path())
        .args(["list", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("{CONTROLLER_ID}\n")));
}

#[test]
fn test_remove_unknown_controller() {
    let dir = TempDir::new().unwrap();
    arcdeck_cmd(dir.path())
        .args(["remove", "nowhere", "--yes"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_edit_unknown_controller() {
    let dir = TempDir::new().unwrap();
    seed_state(dir.path());
    arcdeck_cmd(dir.path())
        .args(["edit", "west", "--name", "north"])
        .assert()
        .code(4);
}

#[test]
fn test_edit_renames_and_persists() {
    let dir = TempDir::new().unwrap();
    seed_state(dir.path());

    arcdeck_cmd(dir.path())
        .args(["edit", "EAST", "--name", "north", "-o", "plain"])
        .assert()
        .success();

    let saved = std::fs::read_to_string(dir.path().join("controllers.toml")).unwrap();
    assert!(saved.contains("name = \"north\""), "{saved}");
    assert!(saved.contains(CONTROLLER_ID));
}

#[test]
fn test_add_rejects_bad_url() {
    let dir = TempDir::new().unwrap();
    arcdeck_cmd(dir.path())
        .args(["add", "not a url", "-n", "arc", "-u", "admin"])
        .assert()
        .code(2);
}

// ── Refresh ─────────────────────────────────────────────────────────

#[test]
fn test_refresh_without_controllers() {
    let dir = TempDir::new().unwrap();
    arcdeck_cmd(dir.path())
        .arg("refresh")
        .assert()
        .success()
        .stderr(predicate::str::contains("No controllers to refresh"));
}

#[test]
fn test_refresh_non_interactive_without_password() {
    let dir = TempDir::new().unwrap();
    seed_state(dir.path());
    arcdeck_cmd(dir.path())
        .args(["refresh", "east", "--non-interactive"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No password available"));
}

#[test]
fn test_refresh_rejects_unknown_category() {
    let dir = TempDir::new().unwrap();
    arcdeck_cmd(dir.path())
        .args(["refresh", "-C", "devices"])
        .assert()
        .code(2);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_overrides() {
    let dir = TempDir::new().unwrap();
    arcdeck_cmd(dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("config.toml")
                .and(predicate::str::contains("controllers.toml")),
        );
}

#[test]
fn test_config_init_then_show() {
    let dir = TempDir::new().unwrap();
    arcdeck_cmd(dir.path())
        .args(["config", "init"])
        .assert()
        .success();
    assert!(dir.path().join("config.toml").exists());

    arcdeck_cmd(dir.path())
        .args(["config", "init"])
        .assert()
        .code(2);

    arcdeck_cmd(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("timeout_secs = 30"));
}
