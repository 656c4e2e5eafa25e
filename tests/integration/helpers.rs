//! Shared fixtures for validation integration tests
//!
//! `FakeRuntime` stands in for a real interpreter: each command is a
//! `sh -c` body that receives the two paths of the runtime contract as `$1`
//! and `$2`, so tests can script any engine behavior (write a failure
//! report, write an executed notebook, hang, crash) without Python.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Result;
use serde_json::{json, Value};
use tempfile::TempDir;

use snippet_validator::config::HarnessConfig;
use snippet_validator::models::ValidationResult;
use snippet_validator::runtime::Runtime;
use snippet_validator::{validate, ValidationRun};

/// File name the fake script shim reports for its own frames
pub const FAKE_SHIM: &str = "/fake/harness/run_script.py";

/// Path fragment marking the fake kernel's own frames
pub const FAKE_ENGINE: &str = "/fake/engine/";

pub struct FakeRuntime {
    pub script_body: String,
    pub notebook_body: String,
}

impl FakeRuntime {
    pub fn script(body: impl Into<String>) -> Self {
        Self {
            script_body: body.into(),
            notebook_body: "exit 0".to_string(),
        }
    }

    pub fn notebook(body: impl Into<String>) -> Self {
        Self {
            script_body: "exit 0".to_string(),
            notebook_body: body.into(),
        }
    }

    fn sh(body: &str, first: &Path, second: &Path) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(body).arg("sh").arg(first).arg(second);
        cmd
    }
}

impl Runtime for FakeRuntime {
    fn name(&self) -> &str {
        "fake"
    }

    fn script_command(&self, script: &Path, report: &Path) -> Result<Command> {
        Ok(Self::sh(&self.script_body, script, report))
    }

    fn notebook_command(&self, input: &Path, executed: &Path) -> Result<Command> {
        Ok(Self::sh(&self.notebook_body, input, executed))
    }

    fn is_harness_frame(&self, file: &str) -> bool {
        file == FAKE_SHIM
    }

    fn is_engine_frame(&self, file: &str) -> bool {
        file.contains(FAKE_ENGINE)
    }
}

/// Run one validation with the given runtime and configuration
pub fn run_validation(
    runtime: &FakeRuntime,
    config: &HarnessConfig,
    snippet: &Path,
    dependencies: &[&str],
) -> ValidationResult {
    let dependencies: Vec<String> = dependencies.iter().map(|d| d.to_string()).collect();
    let label = snippet.display().to_string();
    let run = ValidationRun::new(config, runtime, &label);
    validate(snippet, &dependencies, &run)
}

/// Serialize a result the way the binary prints it
pub fn to_json(result: &ValidationResult) -> Value {
    serde_json::to_value(result).expect("Failed to serialize result")
}

/// Write `content` to `name` inside `dir`, returning the path
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write fixture");
    path
}

/// Body for a fake script shim that writes `report` as the failure report
/// and exits 1
pub fn report_body(report: &Value) -> String {
    format!(
        "cat > \"$2\" <<'REPORT'\n{}\nREPORT\nexit 1",
        serde_json::to_string(report).expect("Failed to encode report")
    )
}

/// Body for a fake notebook engine that writes `executed` and exits `code`
pub fn engine_body(executed: &Value, code: i32) -> String {
    format!(
        "cat > \"$2\" <<'NOTEBOOK'\n{}\nNOTEBOOK\nexit {code}",
        serde_json::to_string(executed).expect("Failed to encode notebook")
    )
}

/// A v4 code cell
pub fn code_cell(source: Value, outputs: Value) -> Value {
    json!({
        "cell_type": "code",
        "execution_count": null,
        "metadata": {},
        "outputs": outputs,
        "source": source,
    })
}

/// A v4 error output whose traceback carries the given frames
pub fn error_output(ename: &str, evalue: &str, frames: &[Value]) -> Value {
    json!({
        "output_type": "error",
        "ename": ename,
        "evalue": evalue,
        "traceback": frames.iter().map(|f| f.to_string()).collect::<Vec<_>>(),
    })
}

/// A v4 notebook document around `cells`
pub fn notebook(cells: Value) -> Value {
    json!({
        "nbformat": 4,
        "nbformat_minor": 5,
        "metadata": {"language_info": {"name": "python"}},
        "cells": cells,
    })
}

/// Temporary directory holding `name` with `content`
pub fn snippet_in_temp_dir(name: &str, content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = write_file(temp_dir.path(), name, content);
    (temp_dir, path)
}

/// Configuration with short budgets for timeout tests
pub fn short_budget_config() -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.timeouts.script_secs = 1;
    config.timeouts.notebook_base_secs = 1;
    config.timeouts.notebook_per_cell_secs = 0;
    config
}
