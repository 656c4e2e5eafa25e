//! Locating the failing cell of an executed notebook.
//!
//! The first code cell carrying an error output is the failing cell. Its
//! traceback is relative to the cell, so the top-most frame is moved onto the
//! notebook itself: the file becomes the notebook path and the line is shifted
//! by the number of source lines in every code cell before it.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::HarnessError;
use crate::exception::strip_leading_frames;
use crate::models::{ExceptionRecord, StackFrame};

/// Cell source: a single string or a list of line strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CellSource {
    Joined(String),
    Lines(Vec<String>),
}

impl Default for CellSource {
    fn default() -> Self {
        CellSource::Joined(String::new())
    }
}

impl CellSource {
    pub fn text(&self) -> String {
        match self {
            CellSource::Joined(text) => text.clone(),
            CellSource::Lines(lines) => lines.concat(),
        }
    }

    /// Number of newline-delimited pieces of the joined source.
    ///
    /// A trailing newline counts as an extra (empty) line and an empty source
    /// counts as one line.
    pub fn line_count(&self) -> u32 {
        let count = self.text().split('\n').count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CellOutput {
    pub output_type: String,
    #[serde(default)]
    pub ename: Option<String>,
    #[serde(default)]
    pub evalue: Option<String>,
    #[serde(default)]
    pub traceback: Vec<String>,
}

impl CellOutput {
    fn is_error(&self) -> bool {
        self.output_type == "error"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutedCell {
    pub cell_type: String,
    #[serde(default)]
    pub source: CellSource,
    #[serde(default)]
    pub outputs: Vec<CellOutput>,
}

/// An executed notebook as written back by the engine (always v4).
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutedNotebook {
    #[serde(default)]
    pub cells: Vec<ExecutedCell>,
}

impl ExecutedNotebook {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read executed notebook {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse executed notebook {}", path.display()))
    }

    fn code_cells(&self) -> impl Iterator<Item = &ExecutedCell> {
        self.cells.iter().filter(|c| c.cell_type == "code")
    }

    /// First error output of any code cell, with the line offset of its cell.
    pub fn first_error(&self) -> Option<(&CellOutput, u32)> {
        let mut offset: u32 = 0;
        for cell in self.code_cells() {
            if let Some(error) = cell.outputs.iter().find(|o| o.is_error()) {
                return Some((error, offset));
            }
            offset = offset.saturating_add(cell.source.line_count());
        }
        None
    }
}

/// Decode a traceback whose entries are JSON-encoded frames.
pub fn decode_traceback(entries: &[String]) -> Result<Vec<StackFrame>, HarnessError> {
    entries
        .iter()
        .map(|entry| {
            serde_json::from_str::<StackFrame>(entry)
                .map_err(|e| HarnessError::MalformedTraceback(format!("{e}: {entry}")))
        })
        .collect()
}

/// Build the record for the first failing cell of `executed`.
///
/// `is_engine_frame` identifies leading frames of the kernel machinery, which
/// are removed before the top-most frame is relocated.
pub fn locate_failure(
    executed: &ExecutedNotebook,
    notebook_path: &Path,
    is_engine_frame: &dyn Fn(&str) -> bool,
) -> Result<ExceptionRecord, HarnessError> {
    let (error, offset) = executed
        .first_error()
        .ok_or(HarnessError::MissingErrorOutput)?;

    let mut stack = decode_traceback(&error.traceback)?;
    strip_leading_frames(&mut stack, is_engine_frame);

    let top = stack
        .first_mut()
        .ok_or_else(|| HarnessError::MalformedTraceback("traceback has no frames".to_string()))?;
    top.file = Some(notebook_path.display().to_string());
    top.line = top.line.map(|line| line.saturating_add(offset));

    let failing = stack
        .last()
        .cloned()
        .ok_or_else(|| HarnessError::MalformedTraceback("traceback has no frames".to_string()))?;

    Ok(ExceptionRecord {
        name: error.ename.clone().unwrap_or_default(),
        message: error.evalue.clone().unwrap_or_default(),
        file_name: failing.file,
        line_number: failing.line,
        line: failing.text,
        stack,
    })
}
