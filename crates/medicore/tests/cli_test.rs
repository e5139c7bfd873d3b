//! Integration tests for the `medicore` CLI binary.
//!
//! Argument parsing and local errors run without any server. The session
//! flows run against a wiremock clinic API.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `medicore` binary with env isolation.
///
/// Clears all `MEDICORE_*` env vars and points config and cache
/// directories at `home` so tests never touch the user's real setup.
fn medicore_cmd(home: &std::path::Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("medicore");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_CACHE_HOME", home.join("cache"))
        .env_remove("MEDICORE_PROFILE")
        .env_remove("MEDICORE_API_URL")
        .env_remove("MEDICORE_OUTPUT")
        .env_remove("MEDICORE_TIMEOUT")
        .env_remove("MEDICORE_EMAIL")
        .env_remove("MEDICORE_PASSWORD")
        .env_remove("MEDICORE_NEW_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn api_url(server: &MockServer) -> String {
    format!("{}/api/v1/", server.uri())
}

fn doctor(id: &str) -> Value {
    json!({
        "_id": id,
        "firstName": "Doc",
        "lastName": id,
        "email": format!("{id}@clinic.test"),
        "doctorDepartment": "Cardiology"
    })
}

async fn mount_anonymous_probe(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/user/admin/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Admin Not Authenticated!"
        })))
        .mount(server)
        .await;
}

async fn mount_login_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/user/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "adminToken=abc123; Path=/")
                .set_body_json(json!({
                    "success": true,
                    "message": "Login Successfully!",
                    "user": { "_id": "a1", "firstName": "Ada", "lastName": "Admin", "role": "Admin" }
                })),
        )
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = medicore_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = tempfile::tempdir().unwrap();
    medicore_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("clinic")
                .and(predicate::str::contains("doctors"))
                .and(predicate::str::contains("appointments"))
                .and(predicate::str::contains("shell")),
        );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    medicore_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("medicore"));
}

// ── Local errors ────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let home = tempfile::tempdir().unwrap();
    let output = medicore_cmd(home.path()).arg("patients").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(text.contains("patients"), "Expected subcommand in error:\n{text}");
}

#[test]
fn test_bad_status_value_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    medicore_cmd(home.path())
        .args(["appointments", "set-status", "ap1", "maybe"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("expected pending, accepted or rejected"));
}

#[test]
fn test_unknown_profile() {
    let home = tempfile::tempdir().unwrap();
    medicore_cmd(home.path())
        .args(["--profile", "staging", "doctors", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown profile 'staging'"));
}

#[test]
fn test_unknown_view_path() {
    let home = tempfile::tempdir().unwrap();
    medicore_cmd(home.path())
        .args(["open", "/patients"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("No view at '/patients'"));
}

#[test]
fn test_bad_api_url_rejected_before_any_request() {
    let home = tempfile::tempdir().unwrap();
    medicore_cmd(home.path())
        .args(["--api-url", "ftp://clinic.test/", "doctors", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("api_url"));
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_path_points_at_toml() {
    let home = tempfile::tempdir().unwrap();
    medicore_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_profiles_empty() {
    let home = tempfile::tempdir().unwrap();
    medicore_cmd(home.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No profiles configured"));
}

#[test]
fn test_config_use_unknown_profile() {
    let home = tempfile::tempdir().unwrap();
    medicore_cmd(home.path())
        .args(["config", "use", "staging"])
        .assert()
        .code(2);
}

// ── Session flows ───────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_anonymous_without_credentials_is_auth_error() {
    let server = MockServer::start().await;
    mount_anonymous_probe(&server).await;
    let home = tempfile::tempdir().unwrap();

    medicore_cmd(home.path())
        .args(["--no-cache", "--api-url", &api_url(&server), "doctors", "list"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Not logged in"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_login_then_list_doctors_as_json() {
    let server = MockServer::start().await;
    mount_anonymous_probe(&server).await;
    mount_login_ok(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "doctors": [doctor("D1"), doctor("D2")]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();

    let output = medicore_cmd(home.path())
        .env("MEDICORE_EMAIL", "admin@example.com")
        .env("MEDICORE_PASSWORD", "Admin@123")
        .args(["--no-cache", "--api-url", &api_url(&server), "-o", "json"])
        .args(["doctors", "list"])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let doctors: Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = doctors
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["D1", "D2"]);
    assert!(String::from_utf8_lossy(&output.stderr).contains("Welcome, Ada Admin"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rejected_login_shows_server_message() {
    let server = MockServer::start().await;
    mount_anonymous_probe(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/user/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "message": "Invalid Email Or Password!"
        })))
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();

    medicore_cmd(home.path())
        .env("MEDICORE_EMAIL", "admin@example.com")
        .env("MEDICORE_PASSWORD", "wrong")
        .args(["--no-cache", "--api-url", &api_url(&server), "whoami"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Invalid Email Or Password!"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_message_delete_is_unsupported() {
    let server = MockServer::start().await;
    mount_anonymous_probe(&server).await;
    mount_login_ok(&server).await;
    let home = tempfile::tempdir().unwrap();

    medicore_cmd(home.path())
        .env("MEDICORE_EMAIL", "admin@example.com")
        .env("MEDICORE_PASSWORD", "Admin@123")
        .args(["--no-cache", "--api-url", &api_url(&server), "--yes"])
        .args(["messages", "delete", "m1"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("disabled in demo mode"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_message_show_prints_full_body() {
    let server = MockServer::start().await;
    mount_anonymous_probe(&server).await;
    mount_login_ok(&server).await;
    let body = format!("{} and the rest of it", "Please call me back ".repeat(10));
    Mock::given(method("GET"))
        .and(path("/api/v1/message/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "messages": [
                { "_id": "m1", "firstName": "Pat", "lastName": "Lee", "message": "short" },
                { "_id": "m2", "firstName": "Sam", "lastName": "Roe", "message": body }
            ]
        })))
        .mount(&server)
        .await;
    let home = tempfile::tempdir().unwrap();
    let run = |id: &str| {
        medicore_cmd(home.path())
            .env("MEDICORE_EMAIL", "admin@example.com")
            .env("MEDICORE_PASSWORD", "Admin@123")
            .args(["--no-cache", "--api-url", &api_url(&server)])
            .args(["messages", "show", id])
            .assert()
    };

    run("m2").success().stdout(
        predicate::str::contains("From:   Sam Roe").and(predicate::str::contains(body.as_str())),
    );
    run("m9")
        .code(4)
        .stderr(predicate::str::contains("message 'm9' not found"));
}
