//! Artifact executors.
//!
//! One executor per artifact kind. Both delegate the actual running of code
//! to the run's `Runtime` and enforce the wall-clock budget with the
//! supervisor. Faults of the harness never escape an executor: `run` turns
//! them into an `UnknownException` outcome.

mod notebook;
mod script;

pub use notebook::NotebookExecutor;
pub use script::ScriptExecutor;

use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::error;

use crate::models::{ExceptionRecord, ExecutionOutcome};
use crate::process::diagnostic_stdout;
use crate::validate::ValidationRun;

pub trait Executor {
    /// Execute the artifact, propagating harness faults.
    fn execute(&self, artifact: &Path, run: &ValidationRun) -> Result<ExecutionOutcome>;

    /// Execute the artifact; harness faults become `UnknownException`.
    fn run(&self, artifact: &Path, run: &ValidationRun) -> ExecutionOutcome {
        match self.execute(artifact, run) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Execution failed in the harness: {e:#}");
                ExecutionOutcome::UnknownException(ExceptionRecord::from_fault(&e))
            }
        }
    }
}

/// Bind the artifact's standard streams: no input, stdout diverted to the
/// diagnostic channel, stderr shared with the harness.
fn bind_streams(cmd: &mut Command) -> Result<()> {
    cmd.stdin(Stdio::null())
        .stdout(diagnostic_stdout()?)
        .stderr(Stdio::inherit());
    Ok(())
}

/// Private scratch directory for one execution, named after the run id so
/// leftovers can be matched to the run's logs.
fn scratch_dir(run: &ValidationRun) -> Result<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix(&format!("snippet-{}-", run.id().simple()))
        .tempdir()
        .context("Failed to create execution scratch directory")
}
