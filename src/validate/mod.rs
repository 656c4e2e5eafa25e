//! Result aggregation for one validation run.
//!
//! `validate` is the outer boundary of the harness: it resolves the snippet,
//! installs dependencies, runs the matching executor and folds both outcomes
//! into a `ValidationResult`. Faults and panics raised anywhere below are
//! caught here and reported as an `UnknownException` execution outcome.

mod run;

pub use run::ValidationRun;

use anyhow::Result;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::{error, info};

use crate::executor::{Executor, NotebookExecutor, ScriptExecutor};
use crate::install::run_install_commands;
use crate::models::{ExceptionRecord, ExecutionOutcome, InstallOutcome, ValidationResult};
use crate::snippet::{Snippet, SnippetKind};

/// Validate the snippet at `snippet_path` after installing `dependencies`.
pub fn validate(snippet_path: &Path, dependencies: &[String], run: &ValidationRun) -> ValidationResult {
    let _entered = run.span().enter();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        validate_inner(snippet_path, dependencies, run)
    }));

    let result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            error!("Unknown error: {e:#}");
            unknown(ExceptionRecord::from_fault(&e))
        }
        Err(payload) => {
            let record = ExceptionRecord::from_panic(payload.as_ref());
            error!("Validation panicked: {}", record.message);
            unknown(record)
        }
    };

    info!(status = ?result.status_code, "Validation finished");
    result
}

fn validate_inner(
    snippet_path: &Path,
    dependencies: &[String],
    run: &ValidationRun,
) -> Result<ValidationResult> {
    let snippet = Snippet::resolve(snippet_path)?;
    info!(dependencies = ?dependencies, "Dependency plan");

    let install = run_install_commands(dependencies, run.span());

    let execution = match snippet.kind {
        SnippetKind::Script => ScriptExecutor.run(&snippet.path, run),
        SnippetKind::Notebook => NotebookExecutor.run(&snippet.path, run),
    };

    Ok(ValidationResult::new(install, execution))
}

/// Result for a run that failed before execution produced an outcome.
fn unknown(record: ExceptionRecord) -> ValidationResult {
    ValidationResult::new(
        InstallOutcome::default(),
        ExecutionOutcome::UnknownException(record),
    )
}
