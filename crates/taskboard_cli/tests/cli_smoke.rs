use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("taskboard-{nanos}-{file_name}"))
}

fn taskboard(store_path: &PathBuf) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_taskboard"));
    command
        .env("TASKBOARD_STORE_PATH", store_path)
        .env("TASKBOARD_CONFIG_PATH", temp_path("missing-config.json"))
        .env("TASKBOARD_DISABLE_NOTIFICATIONS", "1");
    command
}

#[test]
fn help_prints_usage_and_succeeds() {
    let store_path = temp_path("cli-smoke-help.json");
    let output = taskboard(&store_path)
        .arg("--help")
        .output()
        .expect("failed to run help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"));
    assert!(stdout.contains("add"));
    assert!(!store_path.exists());
}

#[test]
fn version_succeeds() {
    let store_path = temp_path("cli-smoke-version.json");
    let output = taskboard(&store_path)
        .arg("--version")
        .output()
        .expect("failed to run version");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("taskboard"));
}

#[test]
fn unknown_command_reports_invalid_input() {
    let store_path = temp_path("cli-smoke-unknown.json");
    let output = taskboard(&store_path)
        .arg("frobnicate")
        .output()
        .expect("failed to run unknown command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
}

#[test]
fn corrupt_store_warns_and_starts_empty() {
    let store_path = temp_path("cli-smoke-corrupt.json");
    std::fs::write(&store_path, "{not json").unwrap();

    let output = taskboard(&store_path)
        .arg("list")
        .output()
        .expect("failed to run list");

    std::fs::remove_file(&store_path).ok();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("WARNING: invalid_data"));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No tasks found."));
}

#[test]
fn broken_config_warns_and_uses_defaults() {
    let store_path = temp_path("cli-smoke-config-store.json");
    let config_path = temp_path("cli-smoke-config.json");
    std::fs::write(&config_path, "[").unwrap();

    let output = taskboard(&store_path)
        .env("TASKBOARD_CONFIG_PATH", &config_path)
        .arg("stats")
        .output()
        .expect("failed to run stats");

    std::fs::remove_file(&config_path).ok();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("WARNING:"));
    assert!(
        String::from_utf8_lossy(&output.stdout)
            .contains("Total: 0 | Completed: 0 | Pending: 0 | Overdue: 0")
    );
}
