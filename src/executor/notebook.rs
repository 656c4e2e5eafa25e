use anyhow::Result;
use std::path::Path;
use tracing::{info, info_span};

use super::{bind_streams, scratch_dir, Executor};
use crate::error::HarnessError;
use crate::models::ExecutionOutcome;
use crate::notebook::{locate_failure, ExecutedNotebook, NotebookDocument};
use crate::runtime::CELL_FAILURE_EXIT;
use crate::supervisor::{supervise, Deadline, Supervised};
use crate::validate::ValidationRun;

const INPUT_FILE: &str = "input.ipynb";
const EXECUTED_FILE: &str = "executed.ipynb";

/// Runs a notebook cell by cell through the runtime's notebook engine.
///
/// The engine receives a cleaned copy; the file at the snippet path is
/// never modified.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotebookExecutor;

impl Executor for NotebookExecutor {
    fn execute(&self, notebook: &Path, run: &ValidationRun) -> Result<ExecutionOutcome> {
        let span = info_span!(parent: run.span(), "notebook", path = %notebook.display());
        let _entered = span.enter();

        let mut document = NotebookDocument::load(notebook)?;
        let cell_count = document.cell_count();
        document.reset_code_cells();

        let scratch = scratch_dir(run)?;
        let input = scratch.path().join(INPUT_FILE);
        let executed = scratch.path().join(EXECUTED_FILE);
        document.write(&input)?;

        let runtime = run.runtime();
        let mut cmd = runtime.notebook_command(&input, &executed)?;
        bind_streams(&mut cmd)?;

        let deadline = Deadline::notebook(&run.config().timeouts, cell_count);
        info!(
            version = ?document.version(),
            cells = cell_count,
            code_cells = document.code_cell_count(),
            budget_secs = deadline.budget().as_secs(),
            "Executing notebook"
        );

        let status = match supervise(deadline, cmd)? {
            Supervised::TimedOut => {
                info!("Timeout encountered");
                return Ok(ExecutionOutcome::Timeout);
            }
            Supervised::Completed(status) => status,
        };

        match status.code() {
            Some(0) => {
                info!("Execution succeeded");
                Ok(ExecutionOutcome::Success)
            }
            Some(CELL_FAILURE_EXIT) => {
                let executed = ExecutedNotebook::load(&executed)?;
                let is_engine = |file: &str| runtime.is_engine_frame(file);
                let record = locate_failure(&executed, notebook, &is_engine)?;

                info!(
                    exception = %record.name,
                    line = ?record.line_number,
                    "Execution produced an exception"
                );
                Ok(ExecutionOutcome::Exception(record))
            }
            _ => Err(HarnessError::EngineFailed(status).into()),
        }
    }
}
