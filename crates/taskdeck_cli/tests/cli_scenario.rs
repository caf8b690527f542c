//! End-to-end walk through the account lifecycle against a mock backend:
//! register, empty list, create, toggle, delete, empty list again.

use httpmock::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("taskdeck-{nanos}-{name}"))
}

fn taskdeck(session_dir: &Path, api_url: &str) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_taskdeck"));
    cmd.env("TASKDECK_SESSION_PATH", session_dir)
        .env("TASKDECK_API_URL", api_url)
        .env("TASKDECK_CONFIG_PATH", session_dir.join("no-config.json"));
    cmd
}

fn task_json(completed: bool) -> serde_json::Value {
    serde_json::json!({
        "id": 1,
        "user_id": "9",
        "title": "Buy milk",
        "description": null,
        "completed": completed,
        "created_at": "2026-01-05T09:00:00",
        "updated_at": "2026-01-05T09:00:00"
    })
}

#[test]
fn register_create_toggle_delete_round_trip() {
    let server = MockServer::start();
    let session_dir = temp_dir("cli-scenario");
    let api_url = server.base_url();

    server.mock(|when, then| {
        when.method(POST).path("/api/auth/register").json_body(
            serde_json::json!({"email": "a@x.com", "password": "pw123456", "name": "A"}),
        );
        then.status(200).json_body(serde_json::json!({
            "token": "tok-9",
            "user": {"id": 9, "email": "a@x.com", "name": "A"}
        }));
    });

    let output = taskdeck(&session_dir, &api_url)
        .args(["register", "a@x.com", "pw123456", "A"])
        .output()
        .expect("failed to run register command");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Welcome, A!"));

    // Fresh account, empty list.
    let mut list = server.mock(|when, then| {
        when.method(GET)
            .path("/api/tasks")
            .header("authorization", "Bearer tok-9");
        then.status(200).json_body(serde_json::json!({"tasks": []}));
    });

    let output = taskdeck(&session_dir, &api_url)
        .arg("list")
        .output()
        .expect("failed to run list command");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No tasks"));
    list.delete();

    // Create: the new task shows up incomplete on the refetched list.
    server.mock(|when, then| {
        when.method(POST)
            .path("/api/tasks")
            .json_body(serde_json::json!({"title": "Buy milk", "description": null}));
        then.status(201).json_body(task_json(false));
    });
    let mut list = server.mock(|when, then| {
        when.method(GET).path("/api/tasks");
        then.status(200)
            .json_body(serde_json::json!({"tasks": [task_json(false)]}));
    });

    let output = taskdeck(&session_dir, &api_url)
        .args(["add", "Buy milk"])
        .output()
        .expect("failed to run add command");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Added task: Buy milk (1)"));
    assert!(stdout.contains("1 task(s), 0 completed"));
    list.delete();

    // Toggle: completed per backend truth after refetch.
    server.mock(|when, then| {
        when.method(PATCH).path("/api/tasks/1/complete");
        then.status(200).json_body(task_json(true));
    });
    let mut list = server.mock(|when, then| {
        when.method(GET).path("/api/tasks");
        then.status(200)
            .json_body(serde_json::json!({"tasks": [task_json(true)]}));
    });

    let output = taskdeck(&session_dir, &api_url)
        .args(["done", "1"])
        .output()
        .expect("failed to run done command");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Completed task: Buy milk (1)"));
    assert!(stdout.contains("1 task(s), 1 completed"));
    list.delete();

    // Delete: the id is gone from the refetched list.
    server.mock(|when, then| {
        when.method(DELETE).path("/api/tasks/1");
        then.status(204);
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/tasks");
        then.status(200).json_body(serde_json::json!({"tasks": []}));
    });

    let output = taskdeck(&session_dir, &api_url)
        .args(["delete", "1", "--yes"])
        .output()
        .expect("failed to run delete command");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Deleted task: 1"));
    assert!(stdout.contains("0 task(s), 0 completed"));

    let output = taskdeck(&session_dir, &api_url)
        .arg("list")
        .output()
        .expect("failed to run list command");
    std::fs::remove_dir_all(&session_dir).ok();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No tasks"));
}
