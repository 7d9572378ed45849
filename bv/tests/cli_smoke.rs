//! CLI smoke tests for the `bv` binary
//!
//! Only exercise commands that need no network access.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn bv(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bv").expect("bv binary");
    cmd.env("HOME", home.path())
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env_remove("RAPIDAPI_KEY")
        .env_remove("OPENROUTER_API_KEY")
        .current_dir(home.path());
    cmd
}

#[test]
fn help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    bv(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("show-config"))
        .stdout(predicate::str::contains("--log-level"));
}

#[test]
fn show_config_redacts_passwords() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("bv.yml");
    std::fs::write(
        &config,
        "llm:\n  model: mistralai/mistral-small\nauth:\n  users:\n    alice: hunter2\n",
    )
    .unwrap();

    bv(&home)
        .args(["show-config", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("mistralai/mistral-small"))
        .stdout(predicate::str::contains("alice: REDACTED"))
        .stdout(predicate::str::contains("hunter2").not())
        .stdout(predicate::str::contains("# RAPIDAPI_KEY: not set"));
}

#[test]
fn show_config_picks_up_project_local_file() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join(".brandvoice.yml"), "provider:\n  method: get\n").unwrap();

    bv(&home)
        .arg("show-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("method: get"));
}

#[test]
fn run_without_api_keys_fails_before_any_request() {
    let home = TempDir::new().unwrap();
    bv(&home)
        .args(["run", "https://www.linkedin.com/company/acme", "--through", "fetch"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("RAPIDAPI_KEY"));
}

#[test]
fn missing_explicit_config_is_an_error() {
    let home = TempDir::new().unwrap();
    bv(&home)
        .args(["show-config", "--config", "/definitely/not/here/bv.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}
