//! Integration tests for the `hydrohomie` CLI binary.
//!
//! Argument parsing, help output and completions run offline; device
//! commands run against wiremock devices on localhost.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `hydrohomie` binary with env isolation.
///
/// Clears all `HYDROHOMIE_*` env vars and points config and data
/// directories at `home` so tests never touch the user's real files.
fn homie_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("hydrohomie");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("HYDROHOMIE_OUTPUT")
        .env_remove("HYDROHOMIE_TIMEOUT")
        .env_remove("HYDROHOMIE_DIRECTORY")
        .env_remove("HYDROHOMIE_ENGINE__TIMEOUT")
        .env_remove("HYDROHOMIE_DIRECTORY_FILE");
    cmd
}

/// A command wired to an explicit directory file.
fn device_cmd(home: &Path, directory: &Path) -> assert_cmd::Command {
    let mut cmd = homie_cmd(home);
    cmd.arg("--directory").arg(directory).args(["--timeout", "2"]);
    cmd
}

/// Run a prepared command off the async runtime so wiremock keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn seed_directory(path: &Path, addresses: &[&str]) {
    std::fs::write(path, serde_json::to_string(addresses).unwrap()).unwrap();
}

fn read_directory(path: &Path) -> Vec<String> {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn directory_file(home: &tempfile::TempDir) -> PathBuf {
    home.path().join("devices.json")
}

async fn device() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_watering": false,
            "current_water_level": 734,
            "current_temp": 21.5
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Basil",
            "watering_duration": 30,
            "watering_interval": 3600,
            "last_watering_time": 1_700_000_000
        })))
        .mount(&server)
        .await;
    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = homie_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    homie_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("devices")
            .and(predicate::str::contains("water"))
            .and(predicate::str::contains("history"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    homie_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hydrohomie"));
}

#[test]
fn test_invalid_output_format() {
    let home = tempfile::tempdir().unwrap();
    let output = homie_cmd(home.path())
        .args(["--output", "invalid", "devices", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Validation ──────────────────────────────────────────────────────

#[test]
fn test_add_rejects_address_with_scheme() {
    let home = tempfile::tempdir().unwrap();
    let directory = directory_file(&home);
    let output = device_cmd(home.path(), &directory)
        .args(["devices", "add", "http://10.0.0.5"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(!directory.exists());
}

#[test]
fn test_configure_rejects_zero_interval_before_contacting_device() {
    let home = tempfile::tempdir().unwrap();
    let directory = directory_file(&home);
    seed_directory(&directory, &["127.0.0.1:1"]);
    let output = device_cmd(home.path(), &directory)
        .args(["devices", "configure", "127.0.0.1:1", "--interval", "0s"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_remove_requires_yes_when_not_interactive() {
    let home = tempfile::tempdir().unwrap();
    let directory = directory_file(&home);
    seed_directory(&directory, &["10.0.0.5"]);
    let output = device_cmd(home.path(), &directory)
        .args(["devices", "remove", "10.0.0.5"])
        .write_stdin("")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(read_directory(&directory), vec!["10.0.0.5"]);
}

// ── Directory ───────────────────────────────────────────────────────

#[test]
fn test_offline_list_prints_directory() {
    let home = tempfile::tempdir().unwrap();
    let directory = directory_file(&home);
    seed_directory(&directory, &["10.0.0.5", "basil.local:8080"]);
    device_cmd(home.path(), &directory)
        .args(["-o", "plain", "devices", "list", "--offline"])
        .assert()
        .success()
        .stdout("10.0.0.5\nbasil.local:8080\n");
}

#[test]
fn test_remove_with_yes_updates_file() {
    let home = tempfile::tempdir().unwrap();
    let directory = directory_file(&home);
    seed_directory(&directory, &["10.0.0.5", "10.0.0.6"]);
    device_cmd(home.path(), &directory)
        .args(["--yes", "devices", "remove", "10.0.0.5"])
        .assert()
        .success();
    assert_eq!(read_directory(&directory), vec!["10.0.0.6"]);
}

#[test]
fn test_show_unknown_device_is_not_found() {
    let home = tempfile::tempdir().unwrap();
    let directory = directory_file(&home);
    let output = device_cmd(home.path(), &directory)
        .args(["devices", "show", "10.0.0.99"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("devices list"));
}

#[test]
fn test_add_unreachable_device_leaves_directory_untouched() {
    let home = tempfile::tempdir().unwrap();
    let directory = directory_file(&home);
    seed_directory(&directory, &["10.0.0.5"]);
    let output = device_cmd(home.path(), &directory)
        .args(["devices", "add", "127.0.0.1:1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7));
    assert_eq!(read_directory(&directory), vec!["10.0.0.5"]);
}

// ── Devices over HTTP ───────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_add_then_list_as_json() {
    let server = device().await;
    let address = server.address().to_string();
    let home = tempfile::tempdir().unwrap();
    let directory = directory_file(&home);

    let mut add = device_cmd(home.path(), &directory);
    add.args(["devices", "add", &address]);
    let output = run(add).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(read_directory(&directory), vec![address.clone()]);

    let mut list = device_cmd(home.path(), &directory);
    list.args(["-o", "json", "devices", "list"]);
    let output = run(list).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let first = &listed[0];
    assert_eq!(first["address"], json!(address));
    assert_eq!(first["name"], json!("Basil"));
    assert_eq!(first["current_water_level"], json!(734));
    assert_eq!(first["schedule"]["phase"], json!("idle"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_water_posts_to_device() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/water"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let address = server.address().to_string();
    let home = tempfile::tempdir().unwrap();
    let directory = directory_file(&home);
    seed_directory(&directory, &[&address]);

    let mut cmd = device_cmd(home.path(), &directory);
    cmd.args(["water", &address]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Watering started"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_configure_sends_full_schedule() {
    let server = device().await;
    Mock::given(method("POST"))
        .and(path("/config"))
        .and(body_json(json!({
            "name": "Basil",
            "watering_duration": 30,
            "watering_interval": 7200
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let address = server.address().to_string();
    let home = tempfile::tempdir().unwrap();
    let directory = directory_file(&home);
    seed_directory(&directory, &[&address]);

    let mut cmd = device_cmd(home.path(), &directory);
    cmd.args(["devices", "configure", &address, "--interval", "2h"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Interval:  2h"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_history_plain_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([[20.5, 700], [21.0, 690]])),
        )
        .mount(&server)
        .await;
    let address = server.address().to_string();
    let home = tempfile::tempdir().unwrap();
    let directory = directory_file(&home);

    let mut cmd = device_cmd(home.path(), &directory);
    cmd.args(["-o", "plain", "history", &address]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "2\t20.5\t700\n1\t21\t690\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watch_draws_requested_frames() {
    let server = device().await;
    let address = server.address().to_string();
    let home = tempfile::tempdir().unwrap();
    let directory = directory_file(&home);
    seed_directory(&directory, &[&address]);

    let mut cmd = device_cmd(home.path(), &directory);
    cmd.args(["-o", "json-compact", "watch", "--count", "2"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let frames: Vec<&str> = std::str::from_utf8(&output.stdout)
        .unwrap()
        .lines()
        .collect();
    assert_eq!(frames.len(), 2);
    let frame: serde_json::Value = serde_json::from_str(frames[0]).unwrap();
    assert_eq!(frame[0]["address"], json!(address));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_set_then_show() {
    let home = tempfile::tempdir().unwrap();
    homie_cmd(home.path())
        .args(["config", "set", "engine.timeout", "9"])
        .assert()
        .success();

    let output = homie_cmd(home.path())
        .args(["-o", "json", "config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let shown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["engine"]["timeout"], json!(9));
}

#[test]
fn test_config_set_unknown_key_fails() {
    let home = tempfile::tempdir().unwrap();
    let output = homie_cmd(home.path())
        .args(["config", "set", "profiles.home", "x"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}
