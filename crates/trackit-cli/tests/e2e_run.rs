//! E2E CLI tests covering:
//! - `tk run` outcome contract in JSON and text modes
//! - acknowledgement filtering via flag and config file
//! - config discovery failures and input load failures
//! - `tk check`, `--timing`, and `tk completions`
//!
//! Each test runs the `tk` binary as a subprocess in an isolated temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the tk binary, rooted in `dir` with no user
/// config in reach.
fn tk_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tk"));
    cmd.current_dir(dir);
    cmd.env("TRACKIT_LOG", "error");
    cmd.env("HOME", dir);
    cmd.env("XDG_CONFIG_HOME", dir.join("xdg"));
    cmd.env_remove("FORMAT");
    cmd.env_remove("TRACKIT_TIMING");
    cmd
}

fn users() -> Value {
    json!([
        {"username": "bob", "email": "bob@example.com", "role": "REPORTER"},
        {"username": "alice", "email": "alice@example.com", "role": "DEVELOPER",
         "expertiseArea": "BACKEND", "seniority": "MID", "hireDate": "2024-01-01"},
        {"username": "boss", "email": "boss@example.com", "role": "MANAGER",
         "subordinates": ["alice"]}
    ])
}

/// Six commands: three acknowledgements, one listing, two rejections.
fn commands() -> Value {
    json!([
        {"command": "reportTicket", "username": "bob", "timestamp": "2025-01-01",
         "params": {"type": "BUG", "title": "Login fails", "description": "500 on submit",
                    "businessPriority": "LOW", "expertiseArea": "BACKEND", "reportedBy": "bob",
                    "frequency": "OCCASIONAL", "severity": "MODERATE"}},
        {"command": "createMilestone", "username": "boss", "timestamp": "2025-01-14",
         "name": "m1", "dueDate": "2025-03-01", "tickets": [0], "assignedDevs": ["alice"],
         "blockingFor": []},
        {"command": "assignTicket", "username": "alice", "timestamp": "2025-01-14", "ticketID": 0},
        {"command": "viewAssignedTickets", "username": "alice", "timestamp": "2025-01-15"},
        {"command": "reportTicket", "username": "bob", "timestamp": "2025-01-15",
         "params": {"type": "BUG", "title": "Late", "businessPriority": "LOW",
                    "expertiseArea": "BACKEND", "reportedBy": "bob",
                    "frequency": "RARE", "severity": "MINOR"}},
        {"command": "assignTicket", "username": "bob", "timestamp": "2025-01-16", "ticketID": 0}
    ])
}

/// Write the default inputs into `dir`.
fn write_inputs(dir: &Path) {
    fs::write(dir.join("users.json"), users().to_string()).expect("write users");
    fs::write(dir.join("commands.json"), commands().to_string()).expect("write commands");
}

const INPUTS: [&str; 4] = ["--users", "users.json", "--commands", "commands.json"];

fn run_json(dir: &Path, extra: &[&str]) -> Value {
    let output = tk_cmd(dir)
        .arg("run")
        .args(INPUTS)
        .args(extra)
        .arg("--json")
        .output()
        .expect("run should not crash");
    assert!(
        output.status.success(),
        "run failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("run --json should produce valid JSON")
}

// ---------------------------------------------------------------------------
// tk run
// ---------------------------------------------------------------------------

#[test]
fn run_json_omits_acknowledgements() {
    let dir = TempDir::new().expect("tempdir");
    write_inputs(dir.path());

    let outcomes = run_json(dir.path(), &[]);
    let outcomes = outcomes.as_array().expect("array");
    assert_eq!(outcomes.len(), 3);

    assert_eq!(outcomes[0]["command"], "viewAssignedTickets");
    assert_eq!(outcomes[0]["username"], "alice");
    assert_eq!(outcomes[0]["timestamp"], "2025-01-15");
    assert_eq!(outcomes[0]["tickets"][0]["id"], 0);
    assert_eq!(outcomes[0]["tickets"][0]["status"], "IN_PROGRESS");
    assert_eq!(outcomes[0]["tickets"][0]["assignedTo"], "alice");

    assert_eq!(outcomes[1]["error"], "WPER");
    assert_eq!(
        outcomes[1]["message"],
        "Tickets can only be reported during testing phases."
    );
    assert_eq!(outcomes[2]["error"], "ROLE");
}

#[test]
fn include_acks_writes_every_outcome_to_file() {
    let dir = TempDir::new().expect("tempdir");
    write_inputs(dir.path());

    tk_cmd(dir.path())
        .arg("run")
        .args(INPUTS)
        .args(["--include-acks", "-o", "out.json", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = fs::read_to_string(dir.path().join("out.json")).expect("output file");
    let outcomes: Value = serde_json::from_str(&written).expect("valid JSON");
    let outcomes = outcomes.as_array().expect("array");
    assert_eq!(outcomes.len(), 6);
    assert_eq!(outcomes[0]["command"], "reportTicket");
    assert!(outcomes[0].get("error").is_none());
}

#[test]
fn project_config_enables_acknowledgements() {
    let dir = TempDir::new().expect("tempdir");
    write_inputs(dir.path());
    fs::write(dir.path().join("trackit.toml"), "[output]\ninclude_acks = true\n")
        .expect("write config");

    let outcomes = run_json(dir.path(), &[]);
    assert_eq!(outcomes.as_array().map(Vec::len), Some(6));
}

#[test]
fn explicit_config_lengthens_testing_window() {
    let dir = TempDir::new().expect("tempdir");
    write_inputs(dir.path());
    fs::write(
        dir.path().join("long.toml"),
        "[engine]\ntesting_phase_days = 20\n",
    )
    .expect("write config");

    let outcomes = run_json(dir.path(), &["--config", "long.toml"]);
    let outcomes = outcomes.as_array().expect("array");
    assert_eq!(outcomes.len(), 4);
    assert!(outcomes.iter().all(|outcome| outcome["error"] == "WPER"));
}

#[test]
fn text_mode_prints_one_line_per_outcome() {
    let dir = TempDir::new().expect("tempdir");
    write_inputs(dir.path());

    tk_cmd(dir.path())
        .arg("run")
        .args(INPUTS)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "2025-01-15  bob  reportTicket  ERROR WPER: Tickets can only be reported during testing phases.",
        ))
        .stdout(predicate::str::contains("viewAssignedTickets  1 ticket(s) #0"));
}

#[test]
fn format_env_selects_json() {
    let dir = TempDir::new().expect("tempdir");
    write_inputs(dir.path());

    let output = tk_cmd(dir.path())
        .env("FORMAT", "json")
        .arg("run")
        .args(INPUTS)
        .output()
        .expect("run should not crash");
    assert!(output.status.success());
    let outcomes: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert!(outcomes.is_array());
}

#[test]
fn timing_flag_reports_to_stderr() {
    let dir = TempDir::new().expect("tempdir");
    write_inputs(dir.path());

    tk_cmd(dir.path())
        .args(["--timing", "run"])
        .args(INPUTS)
        .arg("--json")
        .assert()
        .success()
        .stderr(predicate::str::contains("timing report:"))
        .stderr(predicate::str::contains("viewAssignedTickets"));
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn malformed_users_file_fails_before_replay() {
    let dir = TempDir::new().expect("tempdir");
    write_inputs(dir.path());
    fs::write(dir.path().join("users.json"), "{not json").expect("write users");

    tk_cmd(dir.path())
        .arg("run")
        .args(INPUTS)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load users from"));
}

#[test]
fn missing_commands_file_fails() {
    let dir = TempDir::new().expect("tempdir");
    write_inputs(dir.path());
    fs::remove_file(dir.path().join("commands.json")).expect("remove");

    tk_cmd(dir.path())
        .arg("run")
        .args(INPUTS)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn invalid_config_is_a_startup_failure() {
    let dir = TempDir::new().expect("tempdir");
    write_inputs(dir.path());
    fs::write(
        dir.path().join("trackit.toml"),
        "[engine]\ntesting_phase_days = 0\n",
    )
    .expect("write config");

    tk_cmd(dir.path())
        .arg("run")
        .args(INPUTS)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config"));
}

#[test]
fn explicit_config_must_exist() {
    let dir = TempDir::new().expect("tempdir");
    write_inputs(dir.path());

    tk_cmd(dir.path())
        .args(["run", "--config", "nope.toml"])
        .args(INPUTS)
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

// ---------------------------------------------------------------------------
// tk check / tk completions
// ---------------------------------------------------------------------------

#[test]
fn check_summarizes_inputs() {
    let dir = TempDir::new().expect("tempdir");
    write_inputs(dir.path());
    let mut log = commands();
    if let Some(list) = log.as_array_mut() {
        list.push(json!({"command": "frobnicate", "username": "mallory", "timestamp": "2025-01-20"}));
    }
    fs::write(dir.path().join("commands.json"), log.to_string()).expect("write commands");

    let output = tk_cmd(dir.path())
        .args(["check", "--json"])
        .args(INPUTS)
        .output()
        .expect("check should not crash");
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(report["users"], 3);
    assert_eq!(report["developers"], 1);
    assert_eq!(report["commands"], 7);
    assert_eq!(report["unknown_commands"], json!(["frobnicate"]));
    assert_eq!(report["unknown_actors"], json!(["mallory"]));
    assert_eq!(report["config"], Value::Null);
}

#[test]
fn completions_generate_for_bash() {
    let dir = TempDir::new().expect("tempdir");
    tk_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tk"));
}
