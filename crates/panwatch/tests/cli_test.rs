//! Integration tests for the `panwatch` CLI binary.
//!
//! Argument parsing, help output, completions and configuration errors,
//! all without a reachable firewall.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `panwatch` binary with env isolation.
///
/// Clears every `PANWATCH_*` variable and points config directories at a
/// nonexistent path so tests never read the user's real configuration.
fn panwatch_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("panwatch");
    cmd.env("HOME", "/tmp/panwatch-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/panwatch-cli-test-nonexistent")
        .env_remove("PANWATCH_PROFILE")
        .env_remove("PANWATCH_HOST")
        .env_remove("PANWATCH_PORT")
        .env_remove("PANWATCH_VSYS")
        .env_remove("PANWATCH_USERNAME")
        .env_remove("PANWATCH_PASSWORD")
        .env_remove("PANWATCH_API_KEY")
        .env_remove("PANWATCH_OUTPUT")
        .env_remove("PANWATCH_INSECURE")
        .env_remove("PANWATCH_TIMEOUT");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = panwatch_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    panwatch_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("PAN-OS")
            .and(predicate::str::contains("rules"))
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    panwatch_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("panwatch"));
}

#[test]
fn test_rules_help_lists_toggles() {
    panwatch_cmd().args(["rules", "--help"]).assert().success().stdout(
        predicate::str::contains("enable").and(predicate::str::contains("disable")),
    );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    panwatch_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    panwatch_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_fish() {
    panwatch_cmd()
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = panwatch_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_rules_list_without_config() {
    let output = panwatch_cmd().args(["rules", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(
        text.contains("host") || text.contains("config"),
        "Expected a configuration hint:\n{text}"
    );
}

#[test]
fn test_unknown_profile_is_not_found() {
    let output = panwatch_cmd()
        .args(["-p", "nope", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("nope"));
}

#[test]
fn test_invalid_output_format() {
    panwatch_cmd()
        .args(["--output", "xml", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("xml"));
}

#[test]
fn test_watch_rejects_short_interval() {
    let output = panwatch_cmd()
        .args(["watch", "--interval", "5", "--host", "fw.test", "--api-key", "k"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("interval"));
}

#[test]
fn test_rules_list_conflicting_filters() {
    panwatch_cmd()
        .args(["rules", "list", "--disabled", "--enabled"])
        .assert()
        .failure()
        .code(2);
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_show_without_file() {
    panwatch_cmd()
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("profiles"));
}

#[test]
fn test_config_profiles_empty() {
    panwatch_cmd().args(["config", "profiles"]).assert().success();
}
