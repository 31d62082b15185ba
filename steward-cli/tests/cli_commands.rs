use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn steward_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("steward"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("STEWARD_GITHUB__TOKEN")
        .env_remove("STEWARD_GITHUB__URL")
        .env_remove("STEWARD_GITHUB__TIMEOUT");
    cmd
}

/// Workspace with `zuul.d/projects.yaml` and `github/projects.yaml`.
fn workspace(registry: &str, projects: &str) -> TempDir {
    let dir = TempDir::new().expect("workspace");
    fs::create_dir_all(dir.path().join("zuul.d")).expect("zuul.d");
    fs::create_dir_all(dir.path().join("github")).expect("github");
    fs::write(dir.path().join("zuul.d/projects.yaml"), registry).expect("registry");
    fs::write(dir.path().join("github/projects.yaml"), projects).expect("projects");
    dir
}

const CLEAN_REGISTRY: &str = "\
- project:
    name: github.com/org/alpha
    gate:
      jobs: [lint]
- project:
    name: github.com/org/beta
    templates: [docs]
";

#[test]
fn check_clean_registry_succeeds() {
    let home = TempDir::new().expect("home");
    let ws = workspace(CLEAN_REGISTRY, "- project: org/alpha\n");

    steward_cmd(home.path())
        .current_dir(ws.path())
        .args(["check", "--skip-remote"])
        .assert()
        .success()
        .stdout(contains("No errors found in zuul.d/projects.yaml!"))
        .stdout(contains("WARNING: remote checks disabled with --skip-remote, skipping the check"));
}

#[test]
fn check_reports_every_violation_and_fails() {
    let home = TempDir::new().expect("home");
    let ws = workspace(
        "\
- project:
    name: github.com/org/c
    templates: [t]
- project:
    name: github.com/org/b
- project:
    name: github.com/org/d
    post:
      jobs:
        - upload:
            voting: false
",
        "- project: org/c\n  default-branch: main\n",
    );

    steward_cmd(home.path())
        .current_dir(ws.path())
        .args(["check", "--skip-remote"])
        .assert()
        .code(1)
        .stdout(contains("ERROR: Wrong alphabetical order: github.com/org/c, github.com/org/b"))
        .stdout(contains("Found project github.com/org/b with no jobs configured."))
        .stdout(contains("Found non-voting job in post:"))
        .stdout(contains("Wrong default-branch for github.com/org/c"))
        .stdout(contains("Found errors in zuul.d/projects.yaml!"));
}

#[test]
fn check_applies_policy_file() {
    let home = TempDir::new().expect("home");
    let ws = workspace(
        "\
- project:
    name: github.com/org/alpha
    templates: [release-pypi, release-npm, legacy]
",
        "[]\n",
    );
    let policy = ws.path().join("policy.yaml");
    fs::write(
        &policy,
        "release-templates: [release-pypi, release-npm]\ndenied-templates: [legacy]\n",
    )
    .expect("policy");

    steward_cmd(home.path())
        .current_dir(ws.path())
        .args(["check", "--skip-remote", "--policy"])
        .arg(&policy)
        .assert()
        .code(1)
        .stdout(contains("Found multiple release jobs for github.com/org/alpha:"))
        .stdout(contains("Found obsolete template for github.com/org/alpha:"));
}

#[test]
fn check_missing_registry_is_an_error() {
    let home = TempDir::new().expect("home");
    let ws = TempDir::new().expect("workspace");

    steward_cmd(home.path())
        .current_dir(ws.path())
        .args(["check", "--skip-remote"])
        .assert()
        .failure()
        .stderr(contains("failed to load registry zuul.d/projects.yaml"));
}

#[test]
fn manage_without_token_fails_before_touching_remote() {
    let home = TempDir::new().expect("home");
    let ws = workspace(CLEAN_REGISTRY, "- project: org/alpha\n");

    steward_cmd(home.path())
        .current_dir(ws.path())
        .args(["manage", "--dry-run"])
        .assert()
        .failure()
        .stderr(contains("no GitHub token"));
}

#[test]
fn manage_unreachable_api_aborts() {
    let home = TempDir::new().expect("home");
    let ws = workspace(CLEAN_REGISTRY, "- project: org/alpha\n");
    let creds = home.path().join(".github-projects.config");
    fs::write(&creds, "[github]\ntoken = t0ken\nurl = http://127.0.0.1:9\ntimeout = 2\n").expect("creds");

    steward_cmd(home.path())
        .current_dir(ws.path())
        .args(["manage", "--dry-run"])
        .assert()
        .failure()
        .stderr(contains("reconciliation aborted"));
}

#[test]
fn manage_rejects_malformed_project_list() {
    let home = TempDir::new().expect("home");
    let ws = workspace(CLEAN_REGISTRY, "- project: not-a-full-name\n");

    steward_cmd(home.path())
        .current_dir(ws.path())
        .env("STEWARD_GITHUB__TOKEN", "t0ken")
        .args(["manage", "-p", "github/projects.yaml"])
        .assert()
        .failure()
        .stderr(contains("failed to load project list github/projects.yaml"));
}

#[test]
fn manage_rejects_malformed_api_url_before_connecting() {
    let home = TempDir::new().expect("home");
    let ws = workspace(CLEAN_REGISTRY, "- project: org/alpha\n");
    let creds = home.path().join(".github-projects.config");
    fs::write(&creds, "[github]\ntoken = t0ken\nurl = api.example.com\n").expect("creds");

    steward_cmd(home.path())
        .current_dir(ws.path())
        .args(["manage", "--dry-run"])
        .assert()
        .failure()
        .stderr(contains("invalid `url` in the [github] section"));
}
