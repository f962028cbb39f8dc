//! Integration tests for the `peplink` CLI binary.
//!
//! Argument parsing, config handling and error exit codes run without a
//! router; the end-to-end cases drive the binary against a wiremock router.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `peplink` binary with env isolation.
///
/// Clears every `PEPLINK_*` variable and points the config directory at
/// `home` so tests never touch the user's real configuration.
fn peplink_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("peplink");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env_remove("RUST_LOG")
        .env_remove("PEPLINK_PROFILE")
        .env_remove("PEPLINK_DEFAULT_PROFILE")
        .env_remove("PEPLINK_URL")
        .env_remove("PEPLINK_USERNAME")
        .env_remove("PEPLINK_PASSWORD")
        .env_remove("PEPLINK_CLIENT_ID")
        .env_remove("PEPLINK_CLIENT_SECRET")
        .env_remove("PEPLINK_OUTPUT")
        .env_remove("PEPLINK_STRICT_TLS")
        .env_remove("PEPLINK_TIMEOUT");
    cmd
}

fn write_config(home: &Path, contents: &str) {
    let dir = home.join("peplink");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), contents).unwrap();
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn ok(response: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "stat": "ok", "response": response }))
}

/// Router with one ethernet and one cellular WAN. Every other endpoint
/// answers 404, which the engine treats as unsupported.
async fn mock_router() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "pauth=cli-session")
                .set_body_json(json!({ "stat": "ok" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status.wan.connection"))
        .respond_with(ok(json!({
            "1": {
                "name": "Starlink", "enable": true, "message": "Connected",
                "priority": 1, "uptime": 7200, "ip": "100.64.0.9"
            },
            "2": {
                "name": "Cellular", "enable": true, "message": "Connected", "priority": 2,
                "cellular": { "signalLevel": 3, "carrier": { "name": "Vodafone" } }
            },
            "order": [1, 2]
        })))
        .mount(&server)
        .await;
    server
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run_against(server: &MockServer, args: &[&str]) -> std::process::Output {
    let home = tempfile::tempdir().unwrap();
    let mut cmd = peplink_cmd(home.path());
    cmd.args(["--url", &server.uri(), "--username", "admin", "--password", "hunter2"])
        .args(args);
    tokio::task::spawn_blocking(move || {
        let output = cmd.output().unwrap();
        drop(home);
        output
    })
    .await
    .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = peplink_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = tempfile::tempdir().unwrap();
    peplink_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("Peplink")
            .and(predicate::str::contains("wans"))
            .and(predicate::str::contains("usage"))
            .and(predicate::str::contains("watch")),
    );
    peplink_cmd(home.path())
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Peplink routers"));
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    peplink_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("peplink"));
}

// ── Argument validation ─────────────────────────────────────────────

#[test]
fn test_invalid_output_format() {
    let home = tempfile::tempdir().unwrap();
    let output = peplink_cmd(home.path())
        .args(["-o", "xml", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("xml"));
}

#[test]
fn test_priority_out_of_range_is_a_usage_error() {
    let home = tempfile::tempdir().unwrap();
    let output = peplink_cmd(home.path())
        .args(["wans", "set-priority", "2", "9"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("priority"));
}

#[test]
fn test_wan_id_must_be_positive() {
    let home = tempfile::tempdir().unwrap();
    peplink_cmd(home.path())
        .args(["wans", "reset-modem", "0"])
        .assert()
        .failure()
        .code(2);
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn test_missing_config_explains_setup() {
    let home = tempfile::tempdir().unwrap();
    let output = peplink_cmd(home.path()).arg("status").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("No router configured"),
        "Expected setup hint in output:\n{text}"
    );
}

#[test]
fn test_config_path_points_into_config_dir() {
    let home = tempfile::tempdir().unwrap();
    peplink_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("peplink").and(predicate::str::contains("config.toml")));
}

#[test]
fn test_config_profiles_and_show() {
    let home = tempfile::tempdir().unwrap();
    write_config(
        home.path(),
        r#"
default_profile = "van"

[profiles.van]
url = "https://192.168.50.1"
username = "admin"
password = "hunter2"

[profiles.cabin]
url = "https://10.0.0.1"
auth_mode = "token"
client_id = "abc"
client_secret_env = "CABIN_SECRET"
"#,
    );

    peplink_cmd(home.path())
        .args(["config", "profiles", "-o", "json-compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"["cabin","van"]"#));

    peplink_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("********")
                .and(predicate::str::contains("hunter2").not())
                .and(predicate::str::contains("CABIN_SECRET")),
        );
}

#[test]
fn test_unknown_profile_lists_available() {
    let home = tempfile::tempdir().unwrap();
    write_config(
        home.path(),
        "[profiles.van]\nurl = \"https://192.168.50.1\"\nusername = \"admin\"\npassword = \"x\"\n",
    );
    let output = peplink_cmd(home.path())
        .args(["-p", "boat", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    let text = combined_output(&output);
    assert!(text.contains("boat"), "Expected profile name in:\n{text}");
    assert!(text.contains("van"), "Expected available profiles in:\n{text}");
}

// ── End to end ──────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_status_json_against_router() {
    let server = mock_router().await;
    let output = run_against(&server, &["status", "-o", "json"]).await;
    let text = combined_output(&output);
    assert!(output.status.success(), "status failed:\n{text}");

    let wans: Value = serde_json::from_slice(&output.stdout).unwrap();
    let wans = wans.as_array().unwrap();
    assert_eq!(wans.len(), 2);
    assert_eq!(wans[0]["name"], "Starlink");
    assert_eq!(wans[1]["kind"], "cellular");
    assert!(text.contains("Vodafone"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_set_priority_posts_change() {
    let server = mock_router().await;
    Mock::given(method("POST"))
        .and(path("/api/config.wan.connection.priority"))
        .and(body_json(json!({
            "instantActive": true,
            "list": [{ "connId": 2, "priority": 3 }]
        })))
        .respond_with(ok(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(&server, &["wans", "set-priority", "2", "3"]).await;
    let text = combined_output(&output);
    assert!(output.status.success(), "set-priority failed:\n{text}");
    assert!(text.contains("WAN 2 priority set to 3"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_wan_exits_not_found() {
    let server = mock_router().await;
    let output = run_against(&server, &["wans", "reset-modem", "7"]).await;
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("WAN 7 not found"));
}
