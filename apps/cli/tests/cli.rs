use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SEED: &str = r#"{
  "Customer": [
    {"name": "Ada", "tier": "gold", "organizationId": "org-1"},
    {"name": "Bob", "tier": "free", "organizationId": "org-1"},
    {"name": "Eve", "tier": "gold", "organizationId": "org-2"}
  ]
}"#;

/// Command running in an empty directory with a clean environment.
fn switchboard(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("switchboard").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("SWITCHBOARD_LOG")
        .env_remove("SWITCHBOARD_LOG_FORMAT")
        .env_remove("RUST_LOG");
    cmd
}

fn with_seed() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("seed.json"), SEED).unwrap();
    dir
}

#[test]
fn lists_actions_for_the_default_admin() {
    let dir = TempDir::new().unwrap();
    switchboard(&dir)
        .arg("actions")
        .assert()
        .success()
        .stdout(predicate::str::contains("objects.create"))
        .stdout(predicate::str::contains("dashboard.open_page"));
}

#[test]
fn members_see_only_read_actions() {
    let dir = TempDir::new().unwrap();
    switchboard(&dir)
        .args(["--role", "Member", "actions", "--page", "objects", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"objects.list\""))
        .stdout(predicate::str::contains("objects.create").not());
}

#[test]
fn runs_an_action_against_the_seed() {
    let dir = with_seed();
    switchboard(&dir)
        .args(["--seed", "seed.json", "run", "objects.count"])
        .args(["--params", r#"{"className": "Customer"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\": 2"));
}

#[test]
fn denied_actions_exit_with_failure() {
    let dir = with_seed();
    switchboard(&dir)
        .args(["--seed", "seed.json", "--role", "Member", "run", "objects.delete"])
        .args(["--params", r#"{"className": "Customer", "objectId": "x"}"#])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"success\": false"));
}

#[test]
fn missing_organization_is_reported() {
    let dir = TempDir::new().unwrap();
    switchboard(&dir)
        .args(["--no-org", "--advisory", "run", "dashboard.summary"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Organization ID is required"));
}

#[test]
fn config_file_and_env_are_layered() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("switchboard.toml"),
        "function_timeout_ms = 1000\n\n[session]\nuser = \"ada\"\n",
    )
    .unwrap();

    switchboard(&dir)
        .env("SWITCHBOARD_FUNCTION_TIMEOUT_MS", "2000")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"user\": \"ada\""))
        .stdout(predicate::str::contains("\"function_timeout_ms\": 2000"));
}

#[test]
fn explicit_config_must_exist() {
    let dir = TempDir::new().unwrap();
    switchboard(&dir)
        .args(["--config", "nope.toml", "stats"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn routes_resolve_by_segment() {
    let dir = TempDir::new().unwrap();
    switchboard(&dir)
        .args(["route", "/objects/Customer"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"pageId\": \"objects\""))
        .stdout(predicate::str::contains("\"className\": \"Customer\""));

    switchboard(&dir)
        .args(["route", "/custom-objects"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no page for path"));
}

#[test]
fn exports_tools() {
    let dir = TempDir::new().unwrap();
    switchboard(&dir)
        .arg("tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"objects_list\""))
        .stdout(predicate::str::contains("\"actionId\": \"objects.list\""));
}

#[test]
fn scripts_share_one_session() {
    let dir = with_seed();
    fs::write(
        dir.path().join("script.json"),
        r#"[
            {"name": "dashboard_open_page", "arguments": {"page": "workflows"}},
            {"name": "functions.register", "arguments": {"name": "echo"}},
            {"name": "functions_invoke", "arguments": {"name": "echo", "payload": {"hello": "world"}}}
        ]"#,
    )
    .unwrap();

    switchboard(&dir)
        .args(["--seed", "seed.json", "script", "script.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"page\": \"workflows\""))
        .stdout(predicate::str::contains("\"hello\": \"world\""));
}

#[test]
fn stats_count_pages() {
    let dir = TempDir::new().unwrap();
    switchboard(&dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"totalPages\": 6"))
        .stdout(predicate::str::contains("\"totalActions\": 22"));
}
