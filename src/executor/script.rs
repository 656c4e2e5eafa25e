use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{info, info_span};

use super::{bind_streams, scratch_dir, Executor};
use crate::error::HarnessError;
use crate::exception::{normalize, FrameStripping, RawFailure};
use crate::models::ExecutionOutcome;
use crate::supervisor::{supervise, Deadline, Supervised};
use crate::validate::ValidationRun;

const REPORT_FILE: &str = "failure.json";

/// Runs a single-file script as the main module.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptExecutor;

impl Executor for ScriptExecutor {
    fn execute(&self, script: &Path, run: &ValidationRun) -> Result<ExecutionOutcome> {
        let span = info_span!(parent: run.span(), "script", path = %script.display());
        let _entered = span.enter();

        // Opened only to fail before spawning; the runtime reads the source.
        fs::File::open(script)
            .with_context(|| format!("Failed to read script {}", script.display()))?;

        let scratch = scratch_dir(run)?;
        let report = scratch.path().join(REPORT_FILE);

        let runtime = run.runtime();
        let mut cmd = runtime.script_command(script, &report)?;
        bind_streams(&mut cmd)?;

        let deadline = Deadline::script(&run.config().timeouts);
        info!(
            budget_secs = deadline.budget().as_secs(),
            "Executing script"
        );

        let status = match supervise(deadline, cmd)? {
            Supervised::TimedOut => {
                info!("Timeout encountered");
                return Ok(ExecutionOutcome::Timeout);
            }
            Supervised::Completed(status) => status,
        };

        if report.exists() {
            let content = fs::read_to_string(&report)
                .with_context(|| format!("Failed to read failure report {}", report.display()))?;
            let raw: RawFailure =
                serde_json::from_str(&content).context("Failed to parse failure report")?;
            let is_harness = |file: &str| runtime.is_harness_frame(file);
            let record = normalize(raw, FrameStripping::Leading(&is_harness))?;

            info!(
                exception = %record.name,
                line = ?record.line_number,
                "Execution produced an exception"
            );
            return Ok(ExecutionOutcome::Exception(record));
        }

        if !status.success() {
            return Err(HarnessError::MissingFailureReport(status).into());
        }

        info!("Execution succeeded");
        Ok(ExecutionOutcome::Success)
    }
}
