use httpmock::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("taskdeck-{nanos}-{name}"))
}

fn interactive(session_dir: &Path, api_url: &str, script: &str) -> std::process::Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_taskdeck"))
        .env("TASKDECK_SESSION_PATH", session_dir)
        .env("TASKDECK_API_URL", api_url)
        .env("TASKDECK_CONFIG_PATH", session_dir.join("no-config.json"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn interactive shell");

    child
        .stdin
        .take()
        .expect("stdin piped")
        .write_all(script.as_bytes())
        .unwrap();
    child.wait_with_output().expect("shell did not exit")
}

#[test]
fn help_and_exit() {
    let session_dir = temp_dir("shell-help");
    let output = interactive(&session_dir, "http://localhost:1", "help\nexit\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"));
}

#[test]
fn one_login_serves_later_commands_in_the_same_shell() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/auth/login");
        then.status(200).json_body(serde_json::json!({
            "token": "tok-1",
            "user": {"id": 7, "email": "a@x.com", "name": "Ada"}
        }));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/tasks")
            .header("authorization", "Bearer tok-1");
        then.status(200).json_body(serde_json::json!({"tasks": []}));
    });

    let session_dir = temp_dir("shell-session");
    let output = interactive(
        &session_dir,
        &server.base_url(),
        "login a@x.com pw123456\nlist\nexit\n",
    );

    std::fs::remove_dir_all(&session_dir).ok();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Welcome, Ada!"));
    assert!(stdout.contains("No tasks"));
}

#[test]
fn parse_errors_keep_the_shell_alive() {
    let session_dir = temp_dir("shell-parse-error");
    let output = interactive(
        &session_dir,
        "http://localhost:1",
        "frobnicate\nadd \"unterminated\nexit\n",
    );

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
    assert!(stderr.contains("unterminated quote"));
}
