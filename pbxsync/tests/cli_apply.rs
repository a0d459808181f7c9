//! CLI tests for `pbxsync apply` and `pbxsync check`.
//!
//! Spawns the binary against a temp copy of the Flutter runner fixture and
//! verifies exit codes and what ends up on disk.

use std::process::Command;

use pbxsync::exit_codes;
use pbxsync::test_support::{FLUTTER_RUNNER_PBXPROJ, MINIMAL_PBXPROJ, ProjectDir};

fn pbxsync() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_pbxsync"));
    command.env_remove("RUST_LOG");
    command
}

#[test]
fn apply_writes_project_and_reports_summary() {
    let dir = ProjectDir::with_contents(FLUTTER_RUNNER_PBXPROJ).expect("project dir");

    let output = pbxsync()
        .arg("apply")
        .arg(dir.bundle())
        .output()
        .expect("pbxsync apply");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Xcode project updated"), "{stdout}");
    assert!(stdout.contains("Added 17 files to PaddleOCR"), "{stdout}");
    assert!(stdout.contains("Linked opencv2.framework (framework)"), "{stdout}");
    let written = dir.read().expect("read");
    assert!(written.contains("/* PaddleOCR */"));
    assert!(written.contains("libpaddle_api_light_bundled.a in Frameworks"));
}

#[test]
fn check_reports_drift_until_applied() {
    let dir = ProjectDir::with_contents(FLUTTER_RUNNER_PBXPROJ).expect("project dir");

    let before = pbxsync()
        .arg("check")
        .arg(dir.bundle())
        .status()
        .expect("pbxsync check");
    assert_eq!(before.code(), Some(exit_codes::DRIFT));
    assert_eq!(dir.read().expect("read"), FLUTTER_RUNNER_PBXPROJ);

    let apply = pbxsync()
        .arg("apply")
        .arg(dir.pbxproj_path())
        .status()
        .expect("pbxsync apply");
    assert_eq!(apply.code(), Some(exit_codes::OK));

    let after = pbxsync()
        .arg("check")
        .arg(dir.bundle())
        .status()
        .expect("pbxsync check");
    assert_eq!(after.code(), Some(exit_codes::OK));
}

#[test]
fn dry_run_with_json_leaves_file_alone() {
    let dir = ProjectDir::with_contents(FLUTTER_RUNNER_PBXPROJ).expect("project dir");

    let output = pbxsync()
        .args(["apply", "--dry-run", "--json"])
        .arg(dir.bundle())
        .output()
        .expect("pbxsync apply");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json summary");
    assert_eq!(json["changed"], serde_json::Value::Bool(true));
    assert_eq!(json["written"], serde_json::Value::Bool(false));
    assert_eq!(json["summary"]["files_added"], serde_json::json!(26));
    assert_eq!(dir.read().expect("read"), FLUTTER_RUNNER_PBXPROJ);
}

#[test]
fn missing_root_group_fails_without_writing() {
    // Target still exists; only the app group is renamed.
    let contents = MINIMAL_PBXPROJ.replace("path = Runner;", "path = App;");
    let dir = ProjectDir::with_contents(&contents).expect("project dir");

    let output = pbxsync()
        .arg("apply")
        .arg(dir.bundle())
        .output()
        .expect("pbxsync apply");

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("group 'Runner' not found"), "{stderr}");
    assert_eq!(dir.read().expect("read"), contents);
}

#[test]
fn missing_target_fails_without_writing() {
    let contents = FLUTTER_RUNNER_PBXPROJ.replace("name = Runner;", "name = App;");
    let dir = ProjectDir::with_contents(&contents).expect("project dir");

    let output = pbxsync()
        .arg("apply")
        .arg(dir.bundle())
        .output()
        .expect("pbxsync apply");

    assert_eq!(output.status.code(), Some(exit_codes::FAILED));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("target 'Runner' not found"), "{stderr}");
    assert_eq!(dir.read().expect("read"), contents);
}

#[test]
fn unreadable_project_fails() {
    let temp = tempfile::tempdir().expect("tempdir");
    let status = pbxsync()
        .arg("apply")
        .arg(temp.path().join("Missing.xcodeproj"))
        .status()
        .expect("pbxsync apply");
    assert_eq!(status.code(), Some(exit_codes::FAILED));
}
