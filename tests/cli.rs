//! End-to-end tests for the kanban-md binary.
//!
//! Each test drives the real binary against a board in a temporary
//! directory and checks stdout, stderr, exit codes and the files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// Command with a clean environment rooted at `dir`.
fn kanban(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kanban-md").unwrap();
    cmd.current_dir(dir)
        .env_remove("KANBAN_DIR")
        .env_remove("KANBAN_OUTPUT")
        .env_remove("KANBAN_LOG")
        .env("NO_COLOR", "1");
    cmd
}

/// Run with `--json`, assert success and parse stdout.
fn json(dir: &Path, args: &[&str]) -> Value {
    let output = kanban(dir).args(args).arg("--json").output().unwrap();
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn setup() -> TempDir {
    let temp = TempDir::new().unwrap();
    kanban(temp.path()).args(["init", "--name", "Test"]).assert().success();
    temp
}

fn task_file(dir: &Path, id: u32) -> PathBuf {
    let tasks = dir.join("kanban").join("tasks");
    let prefix = format!("{id:03}-");
    fs::read_dir(&tasks)
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.file_name().unwrap().to_str().unwrap().starts_with(&prefix))
        .unwrap()
}

#[test]
fn test_create_then_show() {
    let temp = setup();
    kanban(temp.path())
        .args(["create", "Fix login", "--priority", "high", "--tags", "bug"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created task #1: Fix login"));

    let task = json(temp.path(), &["show", "1"]);
    assert_eq!(task["id"], 1);
    assert_eq!(task["title"], "Fix login");
    assert_eq!(task["status"], "backlog");
    assert_eq!(task["priority"], "high");
    assert_eq!(task["tags"], serde_json::json!(["bug"]));
    assert!(task.get("due").is_none());

    assert_eq!(json(temp.path(), &["config", "get", "next_id"]), 2);
    assert!(task_file(temp.path(), 1).ends_with("001-fix-login.md"));
}

#[test]
fn test_idempotent_move() {
    let temp = setup();
    kanban(temp.path()).args(["create", "A", "--status", "todo"]).assert().success();
    let before = json(temp.path(), &["show", "1"]);

    kanban(temp.path())
        .args(["move", "1", "todo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unchanged"));

    let after = json(temp.path(), &["show", "1"]);
    assert_eq!(before["updated"], after["updated"]);
    let moves = json(temp.path(), &["log", "--action", "move"]);
    assert_eq!(moves.as_array().unwrap().len(), 0);
}

#[test]
fn test_wip_limit_rejects_then_force_warns() {
    let temp = TempDir::new().unwrap();
    kanban(temp.path())
        .args(["init", "--name", "Wip", "--wip", "in-progress=1"])
        .assert()
        .success();
    kanban(temp.path()).args(["create", "One"]).assert().success();
    kanban(temp.path()).args(["create", "Two"]).assert().success();
    kanban(temp.path()).args(["move", "1", "in-progress"]).assert().success();

    kanban(temp.path())
        .args(["move", "2", "in-progress"])
        .assert()
        .code(13)
        .stderr(predicate::str::contains("error:"));

    let output = kanban(temp.path())
        .args(["move", "2", "in-progress", "--json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(13));
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["error_code"], "WIP_LIMIT_EXCEEDED");
    assert!(body["message"].as_str().unwrap().contains("in-progress"));

    kanban(temp.path())
        .args(["move", "2", "in-progress", "--force"])
        .assert()
        .success()
        .stderr(predicate::str::contains("warning:"));
    assert_eq!(json(temp.path(), &["show", "2"])["status"], "in-progress");
}

#[test]
fn test_pick_takes_over_expired_claim() {
    let temp = setup();
    kanban(temp.path())
        .args(["create", "Stale", "--status", "todo", "--claim", "a"])
        .assert()
        .success();

    // Age the claim well past the default one hour timeout.
    let path = task_file(temp.path(), 1);
    let content = fs::read_to_string(&path).unwrap();
    let aged: Vec<String> = content
        .lines()
        .map(|l| {
            if l.starts_with("claimed_at:") {
                "claimed_at: 2020-01-01T00:00:00Z".to_string()
            } else {
                l.to_string()
            }
        })
        .collect();
    fs::write(&path, aged.join("\n") + "\n").unwrap();

    let picked = json(temp.path(), &["pick", "--claim", "b"]);
    assert_eq!(picked["id"], 1);
    assert_eq!(picked["claimed_by"], "b");

    let claims = json(temp.path(), &["log", "--action", "claim"]);
    let last = claims.as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["task_id"], 1);
    assert_eq!(last["detail"], "b");
}

#[test]
fn test_archive_keeps_file() {
    let temp = setup();
    kanban(temp.path()).args(["create", "Old"]).assert().success();
    kanban(temp.path())
        .args(["archive", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Archived task #1"));

    let content = fs::read_to_string(task_file(temp.path(), 1)).unwrap();
    assert!(content.contains("status: archived"));

    kanban(temp.path())
        .args(["archive", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unchanged"));

    // Hidden from the default list, shown with --archived.
    assert_eq!(json(temp.path(), &["list"]).as_array().unwrap().len(), 0);
    assert_eq!(json(temp.path(), &["list", "--archived"]).as_array().unwrap().len(), 1);
}

#[test]
fn test_board_not_found() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nowhere");
    let output = kanban(temp.path())
        .args(["list", "--json", "--dir"])
        .arg(&missing)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["error_code"], "BOARD_NOT_FOUND");
}

#[test]
fn test_init_twice_fails() {
    let temp = setup();
    kanban(temp.path())
        .args(["init"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("already"));
}

#[test]
fn test_task_not_found_and_invalid_id() {
    let temp = setup();
    kanban(temp.path()).args(["show", "99"]).assert().code(6);
    kanban(temp.path()).args(["show", "abc"]).assert().code(7);
}

#[test]
fn test_invalid_status() {
    let temp = setup();
    kanban(temp.path()).args(["create", "X"]).assert().success();
    let output = kanban(temp.path())
        .args(["move", "1", "nope", "--json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(8));
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["error_code"], "INVALID_STATUS");
}

#[test]
fn test_nothing_to_pick() {
    let temp = setup();
    kanban(temp.path()).args(["pick", "--claim", "bot"]).assert().code(18);
}

#[test]
fn test_delete_requires_confirmation_without_tty() {
    let temp = setup();
    kanban(temp.path()).args(["create", "Doomed"]).assert().success();
    kanban(temp.path())
        .args(["delete", "1"])
        .write_stdin("")
        .assert()
        .code(20);
    assert!(task_file(temp.path(), 1).exists());

    kanban(temp.path()).args(["delete", "1", "--yes"]).assert().success();
    kanban(temp.path()).args(["show", "1"]).assert().code(6);
}

#[test]
fn test_edit_without_changes() {
    let temp = setup();
    kanban(temp.path()).args(["create", "Same", "--priority", "low"]).assert().success();
    kanban(temp.path())
        .args(["edit", "1", "--priority", "low"])
        .assert()
        .code(19);
    kanban(temp.path())
        .args(["edit", "1", "--priority", "high", "--add-tag", "ui"])
        .assert()
        .success();
    let task = json(temp.path(), &["show", "1"]);
    assert_eq!(task["priority"], "high");
    assert_eq!(task["tags"], serde_json::json!(["ui"]));
}

#[test]
fn test_if_status_conflict() {
    let temp = setup();
    kanban(temp.path()).args(["create", "Guarded"]).assert().success();
    kanban(temp.path())
        .args(["move", "1", "todo", "--if-status", "review"])
        .assert()
        .code(15);
}

#[test]
fn test_config_keys() {
    let temp = setup();
    kanban(temp.path())
        .args(["config", "set", "board.name", "Renamed"])
        .assert()
        .success();
    kanban(temp.path())
        .args(["config", "get", "board.name"])
        .assert()
        .success()
        .stdout("Renamed\n");
    kanban(temp.path()).args(["config", "set", "next_id", "9"]).assert().code(12);
    kanban(temp.path()).args(["config", "get", "bogus"]).assert().code(12);
}

#[test]
fn test_board_and_metrics_json_shapes() {
    let temp = setup();
    kanban(temp.path()).args(["create", "A", "--status", "todo"]).assert().success();
    kanban(temp.path()).args(["create", "B", "--status", "done"]).assert().success();

    let board = json(temp.path(), &["board"]);
    assert_eq!(board["board"], "Test");
    assert_eq!(board["total"], 2);
    let names: Vec<&str> = board["statuses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert!(!names.contains(&"archived"));

    let metrics = json(temp.path(), &["metrics"]);
    assert_eq!(metrics["completed"], 1);
    assert_eq!(metrics["throughput_7d"], 1);
    assert!(metrics["aging"].is_array());
}

#[test]
fn test_context_write_to_file() {
    let temp = setup();
    kanban(temp.path()).args(["create", "Ready one", "--status", "todo"]).assert().success();
    let target = temp.path().join("AGENTS.md");
    fs::write(&target, "# Agents\n").unwrap();

    kanban(temp.path())
        .args(["context", "--write-to"])
        .arg(&target)
        .assert()
        .success();

    let content = fs::read_to_string(&target).unwrap();
    assert!(content.starts_with("# Agents\n"));
    assert!(content.contains("<!-- BEGIN kanban-md context -->"));
    assert!(content.contains("Ready one"));
    assert!(content.trim_end().ends_with("<!-- END kanban-md context -->"));
}

#[test]
fn test_output_env_selects_json() {
    let temp = setup();
    kanban(temp.path()).args(["create", "Env"]).assert().success();
    let output = kanban(temp.path())
        .env("KANBAN_OUTPUT", "json")
        .args(["list"])
        .output()
        .unwrap();
    let list: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(list[0]["title"], "Env");
}

#[test]
fn test_compact_output() {
    let temp = setup();
    kanban(temp.path()).args(["create", "Compact me", "--priority", "high"]).assert().success();
    kanban(temp.path())
        .args(["list", "--compact"])
        .assert()
        .success()
        .stdout("1 backlog high Compact me\n");
}

#[test]
fn test_usage_error_exit_code() {
    let temp = setup();
    kanban(temp.path()).args(["move", "1", "--next", "--prev"]).assert().code(12);
}
