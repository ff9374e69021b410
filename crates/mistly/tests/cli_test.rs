//! Integration tests for the `mistly` CLI binary.
//!
//! Argument parsing, help output, completions and config handling run
//! without any network. The assignment tests drive the binary against a
//! wiremock server standing in for the inventory API.
#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::process::Output;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ORG: &str = "org-1";

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `mistly` binary with env isolation.
///
/// Clears every `MISTLY_*` variable the CLI reads and points the config
/// file at a path that does not exist.
fn mistly_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("mistly");
    cmd.env("HOME", "/tmp/mistly-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/mistly-cli-test-nonexistent")
        .env("MISTLY_CONFIG", "/tmp/mistly-cli-test-nonexistent/config.toml")
        .env_remove("MISTLY_PROFILE")
        .env_remove("MISTLY_API_URL")
        .env_remove("MISTLY_ORG")
        .env_remove("MISTLY_API_TOKEN")
        .env_remove("MISTLY_OUTPUT")
        .env_remove("MISTLY_INSECURE")
        .env_remove("MISTLY_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Same as [`mistly_cmd`] with a config file under `dir`.
fn mistly_cmd_with_config(dir: &Path) -> assert_cmd::Command {
    let mut cmd = mistly_cmd();
    cmd.env("MISTLY_CONFIG", dir.join("config.toml"));
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary against `server` off the async runtime.
async fn run_against(server: &MockServer, args: Vec<String>) -> Output {
    let uri = server.uri();
    tokio::task::spawn_blocking(move || {
        mistly_cmd()
            .env("MISTLY_API_URL", uri)
            .env("MISTLY_ORG", ORG)
            .env("MISTLY_API_TOKEN", "test-token")
            .args(["--color", "never"])
            .args(args)
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

fn site_json(id: &str, name: &str) -> serde_json::Value {
    json!({ "id": id, "name": name, "org_id": ORG })
}

async fn mount_search(server: &MockServer, name: &str, results: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/orgs/{ORG}/sites/search")))
        .and(query_param("name", name))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": results,
            "total": 1,
            "limit": 100
        })))
        .mount(server)
        .await;
}

async fn mount_assign(server: &MockServer, site_id: &str, status: u16, expect: u64) {
    Mock::given(method("PUT"))
        .and(path(format!("/api/v1/orgs/{ORG}/inventory")))
        .and(body_partial_json(json!({ "op": "assign", "site_id": site_id })))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({
            "op": "assign",
            "success": [],
            "error": [],
            "reason": []
        })))
        .expect(expect)
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = mistly_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    mistly_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("site codes")
            .and(predicate::str::contains("sites"))
            .and(predicate::str::contains("devices")),
    );
}

#[test]
fn test_version_flag() {
    mistly_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mistly"));
}

#[test]
fn test_assign_help_lists_sources() {
    mistly_cmd()
        .args(["devices", "assign", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--site")
                .and(predicate::str::contains("--file"))
                .and(predicate::str::contains("--csv")),
        );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    mistly_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    mistly_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Argument errors ─────────────────────────────────────────────────

#[test]
fn test_invalid_output_format() {
    let output = mistly_cmd()
        .args(["--output", "xml", "sites", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("xml"));
}

#[test]
fn test_assign_requires_a_source() {
    let output = mistly_cmd()
        .args(["devices", "assign", "--site", "US-NYC-HQ01"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_assign_requires_site_without_csv() {
    let output = mistly_cmd()
        .args(["devices", "assign", "aa:bb:cc:00:00:01"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--site"));
}

#[test]
fn test_csv_conflicts_with_site() {
    let output = mistly_cmd()
        .args(["devices", "assign", "--csv", "aps.csv", "--site", "HQ"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_sites_list_without_config() {
    let output = mistly_cmd().args(["sites", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("No profile configured"),
        "Expected config hint in output:\n{text}"
    );
}

#[test]
fn test_unknown_profile() {
    let output = mistly_cmd()
        .args(["--profile", "nope", "sites", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("nope"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_override() {
    mistly_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "/tmp/mistly-cli-test-nonexistent/config.toml",
        ));
}

#[test]
fn test_config_set_show_and_profiles() {
    let dir = tempfile::tempdir().unwrap();

    mistly_cmd_with_config(dir.path())
        .args(["config", "set", "org_id", "org-42"])
        .assert()
        .success();
    mistly_cmd_with_config(dir.path())
        .args(["config", "set", "api_token", "plaintext-secret"])
        .assert()
        .success();

    mistly_cmd_with_config(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("org-42")
                .and(predicate::str::contains("plaintext-secret").not()),
        );

    mistly_cmd_with_config(dir.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default *"));
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let output = mistly_cmd_with_config(dir.path())
        .args(["config", "set", "colour", "blue"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("colour"));
}

#[test]
fn test_config_use_unknown_profile() {
    let dir = tempfile::tempdir().unwrap();
    let output = mistly_cmd_with_config(dir.path())
        .args(["config", "use", "lab"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Bulk assignment ─────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_single_site_assignment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/sites/site-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(site_json("site-7", "Branch")))
        .expect(1)
        .mount(&server)
        .await;
    mount_assign(&server, "site-7", 200, 1).await;

    let output = run_against(
        &server,
        ["devices", "assign", "aa:bb:cc:00:00:01", "aa:bb:cc:00:00:02", "--site", "site-7"]
            .map(String::from)
            .to_vec(),
    )
    .await;

    let text = combined_output(&output);
    assert!(output.status.success(), "unexpected failure:\n{text}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Bulk AP assignment complete!"));
    assert!(stdout.contains("Successfully assigned: 2 of 2 APs"));
    assert!(stdout.contains("Failed assignments: 0"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_single_site_unknown_name_exits_not_found() {
    let server = MockServer::start().await;
    mount_search(&server, "Nowhere", json!([])).await;
    mount_assign(&server, "unused", 200, 0).await;

    let output = run_against(
        &server,
        ["devices", "assign", "aa:bb:cc:00:00:01", "--site", "Nowhere"]
            .map(String::from)
            .to_vec(),
    )
    .await;

    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("Nowhere"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_single_site_rejected_batch_fails_command() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/sites/site-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(site_json("site-7", "Branch")))
        .mount(&server)
        .await;
    mount_assign(&server, "site-7", 400, 1).await;

    let output = run_against(
        &server,
        ["devices", "assign", "aa:bb:cc:00:00:01", "--site", "site-7"]
            .map(String::from)
            .to_vec(),
    )
    .await;

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Failed assignments: 1"));
    assert!(stdout.contains("#1 aa:bb:cc:00:00:01"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_csv_run_reports_per_site_failures() {
    let server = MockServer::start().await;
    mount_search(&server, "Site-A", json!([site_json("site-1", "Site-A")])).await;
    mount_search(&server, "Unknown Place", json!([])).await;
    mount_assign(&server, "site-1", 200, 1).await;

    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("aps.csv");
    std::fs::write(
        &csv,
        "aa:bb:cc:00:00:01,Site-A\naa:bb:cc:00:00:02,Unknown Place\naa:bb:cc:00:00:03,Site-A\n",
    )
    .unwrap();

    let output = run_against(
        &server,
        vec![
            "devices".into(),
            "assign".into(),
            "--csv".into(),
            csv.display().to_string(),
        ],
    )
    .await;

    let text = combined_output(&output);
    assert!(output.status.success(), "unexpected failure:\n{text}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Successfully assigned: 2 of 3 APs across 2 sites"));
    assert!(stdout.contains("Failed assignments: 1"));
    assert!(stdout.contains("Site \"Unknown Place\":"));
    assert!(stdout.contains("#2 aa:bb:cc:00:00:02: site not found: Unknown Place"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_json_report() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/sites/site-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(site_json("site-7", "Branch")))
        .mount(&server)
        .await;
    mount_assign(&server, "site-7", 200, 1).await;

    let output = run_against(
        &server,
        ["--output", "json", "devices", "assign", "aa:bb:cc:00:00:01", "--site", "site-7"]
            .map(String::from)
            .to_vec(),
    )
    .await;

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["total"], 1);
    assert_eq!(report["succeeded"], 1);
    assert_eq!(report["outcomes"][0]["status"], "succeeded");
}
