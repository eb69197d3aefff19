//! Corruption recovery tests for buddy.
//!
//! These tests verify the system can handle:
//! - Corrupted active session and recall files
//! - Corrupted or partially written journal lines
//! - Invalid configuration

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write as IoWrite;
use tempfile::TempDir;

const NOW: &str = "2026-03-01T22:00:00Z";

fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("buddy").expect("Failed to find buddy binary");
    cmd.env("XDG_CONFIG_HOME", dir.path().join("config"))
        .arg("--data-dir")
        .arg(dir.path().join("data"))
        .arg("--now")
        .arg(NOW);
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn session_dir(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("data").join("session");
    fs::create_dir_all(&path).unwrap();
    path
}

#[test]
fn test_corrupted_session_file_starts_fresh() {
    let temp_dir = setup_test_dir();
    fs::write(
        session_dir(&temp_dir).join("active.json"),
        "{ invalid json }}}}",
    )
    .expect("Failed to write corrupted session");

    // Treated as empty: no profile yet
    cli(&temp_dir)
        .arg("state")
        .assert()
        .failure()
        .stderr(predicate::str::contains("run setup first"));

    cli(&temp_dir)
        .args(["setup", "--weight-lb", "150"])
        .assert()
        .success();
    cli(&temp_dir)
        .args(["add", "--standard-drinks", "1"])
        .assert()
        .success();
    cli(&temp_dir)
        .args(["state", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"drink_count\": 1"));
}

#[test]
fn test_truncated_session_file() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .args(["setup", "--weight-lb", "150"])
        .assert()
        .success();

    let path = session_dir(&temp_dir).join("active.json");
    let contents = fs::read_to_string(&path).unwrap();
    fs::write(&path, &contents[..contents.len() / 2]).unwrap();

    cli(&temp_dir)
        .args(["add", "--standard-drinks", "1"])
        .assert()
        .success();
}

#[test]
fn test_corrupted_recall_file() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .args(["setup", "--weight-lb", "150"])
        .assert()
        .success();
    fs::write(session_dir(&temp_dir).join("recall.json"), "not json").unwrap();

    cli(&temp_dir)
        .arg("undo")
        .assert()
        .failure()
        .stderr(predicate::str::contains("NothingToRestore"));
}

#[test]
fn test_corrupted_journal_lines_skipped() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .args(["setup", "--weight-lb", "150"])
        .assert()
        .success();
    cli(&temp_dir)
        .args(["add", "--standard-drinks", "1"])
        .assert()
        .success();
    cli(&temp_dir).arg("save").assert().success();

    // Garbage plus a partial last line, as after a crash mid-write
    let journal = temp_dir.path().join("data").join("saved_sessions.jsonl");
    let mut file = fs::OpenOptions::new().append(true).open(&journal).unwrap();
    writeln!(file, "{{ invalid json }}").unwrap();
    write!(file, r#"{{"id":"00000000-0000-0000-0000-000000000000","saved_at":"#).unwrap();
    drop(file);

    let output = cli(&temp_dir)
        .args(["history", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let sessions: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(sessions.as_array().unwrap().len(), 1);
}

#[test]
fn test_missing_files_are_fine() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved sessions"));
    cli(&temp_dir)
        .arg("undo")
        .assert()
        .failure()
        .stderr(predicate::str::contains("NothingToRestore"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp_dir = setup_test_dir();
    let config_dir = temp_dir.path().join("config").join("buddy");
    fs::create_dir_all(&config_dir).unwrap();

    fs::write(config_dir.join("config.toml"), "[model\nbroken").unwrap();
    cli(&temp_dir)
        .arg("catalog")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Toml"));

    fs::write(
        config_dir.join("config.toml"),
        "[advisory]\ncaution_bac = 0.2\n",
    )
    .unwrap();
    cli(&temp_dir)
        .arg("catalog")
        .assert()
        .failure()
        .stderr(predicate::str::contains("caution_bac"));
}
