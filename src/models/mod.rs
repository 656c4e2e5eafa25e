pub mod exception;
pub mod outcome;

pub use exception::{ExceptionRecord, StackFrame};
pub use outcome::{
    ExecutionOutcome, InstallError, InstallOutcome, InstallStatus, OverallStatus,
    ValidationResult,
};
