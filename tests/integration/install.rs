//! Dependency installation as part of a validation run

use serde_json::json;
use serial_test::serial;

use snippet_validator::config::HarnessConfig;
use snippet_validator::models::{InstallStatus, OverallStatus};

use super::helpers::{run_validation, snippet_in_temp_dir, to_json, FakeRuntime};

#[test]
#[serial]
fn test_failures_are_collected_in_order_and_do_not_stop_the_plan() {
    let (dir, script) = snippet_in_temp_dir("s.py", "pass\n");
    let marker = dir.path().join("installed");
    let touch = format!("touch {}", marker.display());
    let runtime = FakeRuntime::script("exit 0");

    let result = run_validation(
        &runtime,
        &HarnessConfig::default(),
        &script,
        &["true", "ls /definitely/not/a/dir", "echo hello", "false", touch.as_str()],
    );

    assert!(marker.exists(), "Commands after a failure must still run");
    assert_eq!(result.dependencies.status_code, InstallStatus::Exception);
    assert_eq!(result.dependencies.install_errors.len(), 2);
    assert!(result.dependencies.install_errors[0]
        .stderr
        .contains("/definitely/not/a/dir"));
    assert_eq!(result.dependencies.install_errors[1].stdout, "");
    assert_eq!(result.dependencies.install_errors[1].stderr, "");

    // Install failures are informational only.
    assert_eq!(result.status_code, OverallStatus::Success);
}

#[test]
#[serial]
fn test_install_errors_serialize_as_pairs() {
    let (_dir, script) = snippet_in_temp_dir("s.py", "pass\n");
    let runtime = FakeRuntime::script("exit 0");

    let result = run_validation(
        &runtime,
        &HarnessConfig::default(),
        &script,
        &["sh -c exit", "false"],
    );

    assert_eq!(
        to_json(&result)["dependencies"],
        json!({"status_code": "Exception", "install_errors": [["", ""]]})
    );
}

#[test]
#[serial]
fn test_unspawnable_command_is_an_installer_fault() {
    let (_dir, script) = snippet_in_temp_dir("s.py", "pass\n");
    let runtime = FakeRuntime::script("exit 0");

    let result = run_validation(
        &runtime,
        &HarnessConfig::default(),
        &script,
        &["false", "definitely-not-an-installer --yes", "true"],
    );

    let json = to_json(&result);
    let dependencies = &json["dependencies"];
    assert_eq!(dependencies["status_code"], "UnknownException");
    assert_eq!(dependencies["install_errors"], json!([["", ""]]));
    assert_eq!(dependencies["exception_name"], "IoError");
    assert!(dependencies["exception_message"]
        .as_str()
        .unwrap()
        .contains("definitely-not-an-installer"));

    // Execution still runs and decides the verdict.
    assert_eq!(json["execution"]["status_code"], "Success");
    assert_eq!(json["status_code"], "Success");
}

#[test]
#[serial]
fn test_empty_plan_succeeds() {
    let (_dir, script) = snippet_in_temp_dir("s.py", "pass\n");
    let runtime = FakeRuntime::script("exit 0");

    let result = run_validation(&runtime, &HarnessConfig::default(), &script, &[]);

    assert_eq!(result.dependencies.status_code, InstallStatus::Success);
    assert!(result.dependencies.install_errors.is_empty());
}
