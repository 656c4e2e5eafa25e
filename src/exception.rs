//! Normalization of raw failures into `ExceptionRecord`s.
//!
//! Two sources feed this module: failure reports produced by the runtime for
//! the code under test, and faults of the harness itself (`anyhow` errors and
//! caught panics).

use serde::Deserialize;
use std::any::Any;
use std::panic::Location;

use crate::error::{fault_kind, HarnessError};
use crate::models::{ExceptionRecord, StackFrame};

/// Scope name given to the synthetic frame of a parse-level failure.
pub const MODULE_SCOPE: &str = "<module>";

/// Scope name of frames describing harness faults.
pub const HARNESS_SCOPE: &str = "<harness>";

/// Location metadata carried by a parse-level failure.
///
/// Such failures never reach a call stack of their own; the location is
/// attached to the failure itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SyntaxLocation {
    #[serde(default)]
    pub filename: Option<String>,
    pub lineno: Option<u32>,
    pub text: Option<String>,
}

/// A failure as reported by the runtime, before normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFailure {
    pub name: String,
    #[serde(default)]
    pub message: serde_json::Value,
    #[serde(default)]
    pub stack: Vec<StackFrame>,
    #[serde(default)]
    pub syntax: Option<SyntaxLocation>,
}

/// Whether leading frames are removed before the record is built.
pub enum FrameStripping<'a> {
    /// Keep every frame
    Keep,
    /// Drop leading frames whose file matches the predicate
    Leading(&'a dyn Fn(&str) -> bool),
}

/// Remove every leading frame whose file satisfies `is_internal`.
pub fn strip_leading_frames(stack: &mut Vec<StackFrame>, is_internal: &dyn Fn(&str) -> bool) {
    let keep_from = stack
        .iter()
        .position(|frame| !frame.file.as_deref().is_some_and(is_internal))
        .unwrap_or(stack.len());
    stack.drain(..keep_from);
}

/// Build the record for a failure of the code under test.
pub fn normalize(raw: RawFailure, stripping: FrameStripping<'_>) -> Result<ExceptionRecord, HarnessError> {
    let RawFailure {
        name,
        message,
        mut stack,
        syntax,
    } = raw;

    if let FrameStripping::Leading(is_internal) = stripping {
        strip_leading_frames(&mut stack, is_internal);
    }

    let (file_name, line_number, line) = match syntax {
        Some(location) => {
            stack.push(StackFrame {
                file: location.filename.clone(),
                line: location.lineno,
                scope: MODULE_SCOPE.to_string(),
                text: location.text.clone(),
            });
            (location.filename, location.lineno, location.text)
        }
        None => {
            let last = stack.last().ok_or_else(|| {
                HarnessError::MalformedFailureReport(format!("{name} carried an empty stack"))
            })?;
            (last.file.clone(), last.line, last.text.clone())
        }
    };

    Ok(ExceptionRecord {
        name,
        message: coerce_message(&message),
        file_name,
        line_number,
        line,
        stack,
    })
}

/// Coerce a failure message into text.
///
/// Strings pass through, byte arrays are decoded as UTF-8 (lossily), null is
/// empty, and anything else is stringified.
pub fn coerce_message(message: &serde_json::Value) -> String {
    use serde_json::Value;

    match message {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => match as_bytes(items) {
            Some(bytes) => String::from_utf8_lossy(&bytes).to_string(),
            None => message.to_string(),
        },
        other => other.to_string(),
    }
}

fn as_bytes(items: &[serde_json::Value]) -> Option<Vec<u8>> {
    items
        .iter()
        .map(|item| item.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect()
}

impl ExceptionRecord {
    /// Record for a fault of the harness itself.
    ///
    /// Internal frames are never stripped here: one frame per layer of the
    /// error chain, outermost context first and root cause last, all located
    /// at the component boundary that caught the fault.
    #[track_caller]
    pub fn from_fault(err: &anyhow::Error) -> Self {
        let location = Location::caller();
        let stack: Vec<StackFrame> = err
            .chain()
            .map(|cause| {
                StackFrame::new(
                    location.file(),
                    Some(location.line()),
                    HARNESS_SCOPE,
                    Some(cause.to_string()),
                )
            })
            .collect();

        Self {
            name: fault_kind(err).to_string(),
            message: format!("{err:#}"),
            file_name: Some(location.file().to_string()),
            line_number: Some(location.line()),
            line: Some(err.root_cause().to_string()),
            stack,
        }
    }

    /// Record for a panic caught at the aggregator boundary.
    #[track_caller]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let location = Location::caller();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic with a non-string payload".to_string());

        Self {
            name: "Panic".to_string(),
            message: message.clone(),
            file_name: Some(location.file().to_string()),
            line_number: Some(location.line()),
            line: Some(message.clone()),
            stack: vec![StackFrame::new(
                location.file(),
                Some(location.line()),
                HARNESS_SCOPE,
                Some(message),
            )],
        }
    }
}
