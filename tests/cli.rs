use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn gateway_setup(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("gateway-setup").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    gateway_setup(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("setup"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("--state-file"));
}

#[test]
fn test_status_without_state_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.json");

    gateway_setup(&dir)
        .args(["status", "--state-file"])
        .arg(&missing)
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved configuration"));
}

#[test]
fn test_offline_status_flags_placeholder_id() {
    let dir = TempDir::new().unwrap();
    let state = dir.path().join("gateway_config.json");
    fs::write(
        &state,
        r#"{
  "gateway_url": null,
  "gateway_id": "<GATEWAY_ID>",
  "region": "us-east-1"
}"#,
    )
    .unwrap();

    gateway_setup(&dir)
        .args(["status", "--offline", "--state-file"])
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("<GATEWAY_ID>"))
        .stdout(predicate::str::contains("placeholder"));
}

#[test]
fn test_offline_status_prints_saved_identifiers() {
    let dir = TempDir::new().unwrap();
    let state = dir.path().join("gateway_config.json");
    fs::write(
        &state,
        r#"{
  "gateway_url": "https://gw-1.gateway.bedrock-agentcore.us-east-1.amazonaws.com/mcp",
  "gateway_id": "gw-1",
  "gateway_arn": "arn:aws:bedrock-agentcore:us-east-1:123456789012:gateway/gw-1",
  "region": "us-east-1",
  "client_info": {
    "client_id": "client-1",
    "client_secret": "secret-1"
  },
  "lambda_arn": "arn:aws:lambda:us-east-1:123456789012:function:RefundLambda"
}"#,
    )
    .unwrap();

    gateway_setup(&dir)
        .args(["status", "--offline", "--state-file"])
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("gw-1"))
        .stdout(predicate::str::contains("client-1"))
        .stdout(predicate::str::contains("function:RefundLambda"));
}

#[test]
fn test_invalid_explicit_config_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("broken.toml");
    fs::write(&config, "names = [").unwrap();

    gateway_setup(&dir)
        .args(["status", "--offline", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}
