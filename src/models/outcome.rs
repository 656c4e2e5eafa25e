use serde::{Deserialize, Serialize};

use super::exception::ExceptionRecord;

/// Overall verdict of one validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallStatus {
    Success,
    Timeout,
    Failed,
}

/// Status of the dependency installation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallStatus {
    /// Every install command exited zero
    Success,
    /// At least one install command exited nonzero
    Exception,
    /// The installer itself faulted (e.g. a command could not be spawned)
    UnknownException,
}

/// Captured output of an install command that exited nonzero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct InstallError {
    pub stdout: String,
    pub stderr: String,
}

impl From<(String, String)> for InstallError {
    fn from((stdout, stderr): (String, String)) -> Self {
        Self { stdout, stderr }
    }
}

impl From<InstallError> for (String, String) {
    fn from(error: InstallError) -> Self {
        (error.stdout, error.stderr)
    }
}

/// Result of running the install plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallOutcome {
    pub status_code: InstallStatus,
    /// Failing commands in declaration order
    pub install_errors: Vec<InstallError>,
    /// Present only when the installer itself faulted
    #[serde(flatten)]
    pub exception: Option<ExceptionRecord>,
}

impl Default for InstallOutcome {
    fn default() -> Self {
        Self {
            status_code: InstallStatus::Success,
            install_errors: Vec::new(),
            exception: None,
        }
    }
}

impl InstallOutcome {
    /// Build the outcome for a completed install plan.
    pub fn from_failures(install_errors: Vec<InstallError>) -> Self {
        let status_code = if install_errors.is_empty() {
            InstallStatus::Success
        } else {
            InstallStatus::Exception
        };
        Self {
            status_code,
            install_errors,
            exception: None,
        }
    }

    /// Build the outcome for an installer fault, keeping failures seen so far.
    pub fn fault(install_errors: Vec<InstallError>, record: ExceptionRecord) -> Self {
        Self {
            status_code: InstallStatus::UnknownException,
            install_errors,
            exception: Some(record),
        }
    }
}

/// Result of executing the artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status_code")]
pub enum ExecutionOutcome {
    Success,
    Timeout,
    /// The artifact itself raised
    Exception(ExceptionRecord),
    /// The harness machinery faulted while preparing or running the artifact
    UnknownException(ExceptionRecord),
}

impl ExecutionOutcome {
    pub fn exception(&self) -> Option<&ExceptionRecord> {
        match self {
            ExecutionOutcome::Exception(record) | ExecutionOutcome::UnknownException(record) => {
                Some(record)
            }
            ExecutionOutcome::Success | ExecutionOutcome::Timeout => None,
        }
    }

    /// Overall verdict implied by this outcome.
    pub fn overall_status(&self) -> OverallStatus {
        match self {
            ExecutionOutcome::Success => OverallStatus::Success,
            ExecutionOutcome::Timeout => OverallStatus::Timeout,
            ExecutionOutcome::Exception(_) | ExecutionOutcome::UnknownException(_) => {
                OverallStatus::Failed
            }
        }
    }
}

/// Final verdict emitted as the single JSON result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub status_code: OverallStatus,
    pub dependencies: InstallOutcome,
    pub execution: ExecutionOutcome,
}

impl ValidationResult {
    /// Fold both phases into one verdict.
    ///
    /// The overall status depends on the execution outcome alone; install
    /// failures are informational.
    pub fn new(dependencies: InstallOutcome, execution: ExecutionOutcome) -> Self {
        Self {
            status_code: execution.overall_status(),
            dependencies,
            execution,
        }
    }
}
