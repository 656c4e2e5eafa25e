use serde::{Deserialize, Serialize};

/// One frame of a failure stack.
///
/// Serialized as a `[file, line, scope, text]` array, the same shape the
/// runtime shims emit, so frames pass through the harness unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FrameRepr", into = "FrameRepr")]
pub struct StackFrame {
    /// Absent for failures raised without a source location
    pub file: Option<String>,
    pub line: Option<u32>,
    /// Name of the enclosing scope (`<module>` at top level)
    pub scope: String,
    pub text: Option<String>,
}

type FrameRepr = (Option<String>, Option<u32>, String, Option<String>);

impl From<FrameRepr> for StackFrame {
    fn from((file, line, scope, text): FrameRepr) -> Self {
        Self {
            file,
            line,
            scope,
            text,
        }
    }
}

impl From<StackFrame> for FrameRepr {
    fn from(frame: StackFrame) -> Self {
        (frame.file, frame.line, frame.scope, frame.text)
    }
}

impl StackFrame {
    pub fn new(
        file: impl Into<String>,
        line: Option<u32>,
        scope: impl Into<String>,
        text: Option<String>,
    ) -> Self {
        Self {
            file: Some(file.into()),
            line,
            scope: scope.into(),
            text,
        }
    }
}

/// Structured, location-precise description of a failure.
///
/// The stack is ordered outermost frame first; the primary location
/// (`file_name`, `line_number`, `line`) is the failing frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionRecord {
    #[serde(rename = "exception_name")]
    pub name: String,
    #[serde(rename = "exception_message")]
    pub message: String,
    #[serde(rename = "exception_file_name")]
    pub file_name: Option<String>,
    #[serde(rename = "exception_line_number")]
    pub line_number: Option<u32>,
    #[serde(rename = "exception_line")]
    pub line: Option<String>,
    #[serde(rename = "exception_stack")]
    pub stack: Vec<StackFrame>,
}
