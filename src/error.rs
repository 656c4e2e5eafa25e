//! Classified harness faults.
//!
//! These are faults of the validation machinery itself, never failures of the
//! code under test. Every one of them ends up as an `UnknownException` record.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error(
        "Snippet path {0} is a directory without an obvious entrypoint (a single file or a __main__.py)"
    )]
    NoEntrypoint(PathBuf),

    #[error("Notebook is empty")]
    EmptyNotebook,

    #[error("Notebook version field is missing or not an integer")]
    UnreadableNotebookVersion,

    #[error("Unsupported notebook version: {0}")]
    UnsupportedNotebookVersion(u64),

    #[error("Notebook is in an unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("A deadline is already armed; nested supervision is not supported")]
    DeadlineAlreadyArmed,

    #[error("Runtime exited with {0} without writing a failure report")]
    MissingFailureReport(ExitStatus),

    #[error("Notebook engine exited with {0}")]
    EngineFailed(ExitStatus),

    #[error("Unable to find notebook error output")]
    MissingErrorOutput,

    #[error("Malformed notebook traceback: {0}")]
    MalformedTraceback(String),

    #[error("Malformed failure report: {0}")]
    MalformedFailureReport(String),
}

impl HarnessError {
    /// Stable name reported as `exception_name` for harness faults.
    pub fn kind(&self) -> &'static str {
        match self {
            HarnessError::UnsupportedFileType(_) => "UnsupportedFileType",
            HarnessError::NoEntrypoint(_) => "NoEntrypoint",
            HarnessError::EmptyNotebook => "EmptyNotebook",
            HarnessError::UnreadableNotebookVersion => "UnreadableNotebookVersion",
            HarnessError::UnsupportedNotebookVersion(_) => "UnsupportedNotebookVersion",
            HarnessError::UnsupportedLanguage(_) => "UnsupportedLanguage",
            HarnessError::DeadlineAlreadyArmed => "DeadlineAlreadyArmed",
            HarnessError::MissingFailureReport(_) => "MissingFailureReport",
            HarnessError::EngineFailed(_) => "EngineFailed",
            HarnessError::MissingErrorOutput => "MissingErrorOutput",
            HarnessError::MalformedTraceback(_) => "MalformedTraceback",
            HarnessError::MalformedFailureReport(_) => "MalformedFailureReport",
        }
    }
}

/// Name of the most specific classified fault in an error chain.
///
/// Walks the chain from the outermost context inward and returns the first
/// recognized kind, so a context layer added with `.context()` never hides
/// the underlying classification.
pub fn fault_kind(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(harness) = cause.downcast_ref::<HarnessError>() {
            return harness.kind();
        }
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return "IoError";
        }
        if cause.downcast_ref::<serde_json::Error>().is_some() {
            return "JsonError";
        }
    }
    "Error"
}
