//! End-to-end checks against a real Python interpreter
//!
//! Skipped when `python3` (or, for notebooks, the notebook execution stack)
//! is not installed.

use serial_test::serial;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use snippet_validator::config::{HarnessConfig, RuntimeConfig};
use snippet_validator::models::{ExecutionOutcome, OverallStatus};
use snippet_validator::runtime::PythonRuntime;
use snippet_validator::{validate, ValidationRun};

use super::helpers::{short_budget_config, snippet_in_temp_dir};

fn python_available() -> bool {
    which::which("python3").is_ok()
}

fn notebook_stack_available() -> bool {
    python_available()
        && Command::new("python3")
            .args(["-c", "import nbformat, nbclient, ipykernel"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
}

fn run_python(config: &HarnessConfig, snippet: &std::path::Path) -> snippet_validator::models::ValidationResult {
    let runtime = PythonRuntime::new(RuntimeConfig::default());
    let label = snippet.display().to_string();
    let run = ValidationRun::new(config, &runtime, &label);
    validate(snippet, &[], &run)
}

#[test]
#[serial]
fn test_python_script_success() {
    if !python_available() {
        return;
    }
    let (_dir, script) = snippet_in_temp_dir("ok.py", "print('hello')\nassert __name__ == '__main__'\n");

    let result = run_python(&HarnessConfig::default(), &script);
    assert_eq!(result.status_code, OverallStatus::Success);
}

#[test]
#[serial]
fn test_python_script_failure_line() {
    if !python_available() {
        return;
    }
    let source = "def check(value):\n    if value < 0:\n        raise ValueError('negative value')\n\ncheck(-1)\n";
    let (_dir, script) = snippet_in_temp_dir("check.py", source);

    let result = run_python(&HarnessConfig::default(), &script);

    let ExecutionOutcome::Exception(record) = &result.execution else {
        panic!("Expected Exception, got {:?}", result.execution);
    };
    assert_eq!(record.name, "ValueError");
    assert_eq!(record.message, "negative value");
    assert_eq!(record.file_name.as_deref(), Some(script.to_str().unwrap()));
    assert_eq!(record.line_number, Some(3));
    assert_eq!(record.line.as_deref(), Some("raise ValueError('negative value')"));
    assert_eq!(record.stack.len(), 2, "Shim frames must be stripped");
    assert_eq!(record.stack[0].line, Some(5));
}

#[test]
#[serial]
fn test_python_syntax_error() {
    if !python_available() {
        return;
    }
    let (_dir, script) = snippet_in_temp_dir("bad.py", "x = 1\ny = (\n");

    let result = run_python(&HarnessConfig::default(), &script);

    let record = result.execution.exception().expect("Expected an exception");
    assert_eq!(record.name, "SyntaxError");
    assert_eq!(record.file_name.as_deref(), Some(script.to_str().unwrap()));
    assert_eq!(record.stack.last().unwrap().scope, "<module>");
}

#[test]
#[serial]
fn test_python_raised_syntax_error_has_no_location() {
    if !python_available() {
        return;
    }
    let (_dir, script) = snippet_in_temp_dir("custom.py", "raise SyntaxError('custom')\n");

    let result = run_python(&HarnessConfig::default(), &script);

    let ExecutionOutcome::Exception(record) = &result.execution else {
        panic!("Expected Exception, got {:?}", result.execution);
    };
    assert_eq!(record.name, "SyntaxError");
    assert_eq!(record.message, "custom");
    assert_eq!(record.file_name, None);
    assert_eq!(record.line_number, None);
}

#[test]
#[serial]
fn test_python_busy_loop_times_out() {
    if !python_available() {
        return;
    }
    let (_dir, script) = snippet_in_temp_dir("spin.py", "while True:\n    pass\n");

    let start = Instant::now();
    let result = run_python(&short_budget_config(), &script);

    assert_eq!(result.status_code, OverallStatus::Timeout);
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[test]
#[serial]
fn test_python_notebook_failure_is_located() {
    if !notebook_stack_available() {
        return;
    }
    let content = serde_json::json!({
        "nbformat": 4,
        "nbformat_minor": 5,
        "metadata": {"language_info": {"name": "python"}},
        "cells": [
            {"cell_type": "code", "execution_count": null, "metadata": {}, "outputs": [], "source": "a = 1\nb = 0"},
            {"cell_type": "code", "execution_count": null, "metadata": {}, "outputs": [], "source": "c = 2\nd = 3\ne = 4"},
            {"cell_type": "code", "execution_count": null, "metadata": {}, "outputs": [], "source": "a / b"},
        ],
    });
    let (_dir, path) = snippet_in_temp_dir("nb.ipynb", &content.to_string());

    let result = run_python(&HarnessConfig::default(), &path);

    let record = result.execution.exception().expect("Expected an exception");
    assert_eq!(record.name, "ZeroDivisionError");
    assert_eq!(record.file_name.as_deref(), Some(path.to_str().unwrap()));
    assert_eq!(record.line_number, Some(6));
}

/// Whether `pid` names a live, non-zombie process.
fn process_running(pid: u32) -> bool {
    std::fs::read_to_string(format!("/proc/{pid}/stat"))
        .ok()
        .and_then(|stat| stat.rsplit(')').next().map(|rest| rest.trim_start().to_string()))
        .is_some_and(|state| !state.starts_with('Z'))
}

#[test]
#[serial]
fn test_python_notebook_timeout_takes_the_kernel_down() {
    if !notebook_stack_available() {
        return;
    }
    let dir = tempfile::TempDir::new().unwrap();
    let pid_file = dir.path().join("kernel.pid");
    let cell = format!(
        "import os, time\nopen({:?}, 'w').write(str(os.getpid()))\nwhile True:\n    time.sleep(0.1)",
        pid_file.display().to_string()
    );
    let content = serde_json::json!({
        "nbformat": 4,
        "nbformat_minor": 5,
        "metadata": {"language_info": {"name": "python"}},
        "cells": [
            {"cell_type": "code", "execution_count": null, "metadata": {}, "outputs": [], "source": cell},
        ],
    });
    let path = dir.path().join("spin.ipynb");
    std::fs::write(&path, content.to_string()).unwrap();
    let mut config = HarnessConfig::default();
    config.timeouts.notebook_base_secs = 15;
    config.timeouts.notebook_per_cell_secs = 0;

    let result = run_python(&config, &path);

    assert_eq!(result.status_code, OverallStatus::Timeout);
    let pid: u32 = std::fs::read_to_string(&pid_file)
        .expect("kernel never ran the cell")
        .parse()
        .unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while process_running(pid) && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(100));
    }
    assert!(!process_running(pid), "kernel {pid} outlived the timeout");
}
