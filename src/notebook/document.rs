//! Loading, validation and cleaning of notebook documents.
//!
//! Supported schemas:
//!
//! - v3: cells live under `worksheets[*].cells`; every code cell declares its
//!   own `language`, which must be Python.
//! - v4: cells live under `cells`; the language comes from
//!   `metadata.language_info.name` and defaults to Python.
//!
//! The document is kept as a JSON value so fields the harness does not know
//! about survive the round trip to the execution engine untouched.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::error::HarnessError;

pub const SUPPORTED_LANGUAGE: &str = "python";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotebookVersion {
    V3,
    V4,
}

impl NotebookVersion {
    /// Field holding a code cell's execution count in this schema
    fn execution_count_key(self) -> &'static str {
        match self {
            NotebookVersion::V3 => "prompt_number",
            NotebookVersion::V4 => "execution_count",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotebookDocument {
    version: NotebookVersion,
    root: Value,
}

impl NotebookDocument {
    /// Read and validate the notebook at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read notebook {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to load notebook {}", path.display()))
    }

    /// Parse and validate notebook JSON.
    pub fn parse(content: &str) -> Result<Self> {
        let content = content.trim();
        if content.is_empty() {
            return Err(HarnessError::EmptyNotebook.into());
        }

        let mut root: Value =
            serde_json::from_str(content).context("Notebook is not valid JSON")?;
        if !root.is_object() {
            return Err(HarnessError::UnreadableNotebookVersion.into());
        }

        let version = match root.get("nbformat").and_then(Value::as_u64) {
            Some(3) => NotebookVersion::V3,
            Some(4) => NotebookVersion::V4,
            Some(other) => return Err(HarnessError::UnsupportedNotebookVersion(other).into()),
            None => return Err(HarnessError::UnreadableNotebookVersion.into()),
        };

        if version == NotebookVersion::V4 {
            if let Some(object) = root.as_object_mut() {
                object
                    .entry("cells")
                    .or_insert_with(|| Value::Array(Vec::new()));
            }
        }

        let document = Self { version, root };
        document.check_language()?;
        Ok(document)
    }

    pub fn version(&self) -> NotebookVersion {
        self.version
    }

    fn check_language(&self) -> Result<()> {
        match self.version {
            NotebookVersion::V3 => {
                for cell in self.cells().filter(|c| is_code_cell(c)) {
                    let language = cell.get("language").and_then(Value::as_str).unwrap_or("");
                    if language != SUPPORTED_LANGUAGE {
                        return Err(HarnessError::UnsupportedLanguage(language.to_string()).into());
                    }
                }
            }
            NotebookVersion::V4 => {
                let language = self
                    .root
                    .pointer("/metadata/language_info/name")
                    .and_then(Value::as_str)
                    .unwrap_or(SUPPORTED_LANGUAGE);
                if language != SUPPORTED_LANGUAGE {
                    return Err(HarnessError::UnsupportedLanguage(language.to_string()).into());
                }
            }
        }
        Ok(())
    }

    /// Every cell in document order, code or not.
    pub fn cells(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match self.version {
            NotebookVersion::V3 => Box::new(
                array_items(self.root.get("worksheets"))
                    .flat_map(|worksheet| array_items(worksheet.get("cells"))),
            ),
            NotebookVersion::V4 => Box::new(array_items(self.root.get("cells"))),
        }
    }

    pub fn cell_count(&self) -> usize {
        self.cells().count()
    }

    pub fn code_cell_count(&self) -> usize {
        self.cells().filter(|c| is_code_cell(c)).count()
    }

    /// Clear every code cell's execution count, metadata and outputs so the
    /// executed document only reflects this run.
    pub fn reset_code_cells(&mut self) {
        let count_key = self.version.execution_count_key();
        let cells: Vec<&mut Value> = match self.version {
            NotebookVersion::V3 => match self.root.get_mut("worksheets") {
                Some(Value::Array(worksheets)) => worksheets
                    .iter_mut()
                    .filter_map(|w| match w.get_mut("cells") {
                        Some(Value::Array(cells)) => Some(cells.iter_mut()),
                        _ => None,
                    })
                    .flatten()
                    .collect(),
                _ => Vec::new(),
            },
            NotebookVersion::V4 => match self.root.get_mut("cells") {
                Some(Value::Array(cells)) => cells.iter_mut().collect(),
                _ => Vec::new(),
            },
        };

        for cell in cells {
            if !is_code_cell(cell) {
                continue;
            }
            if let Some(object) = cell.as_object_mut() {
                object.insert(count_key.to_string(), Value::Null);
                object.insert("metadata".to_string(), Value::Object(Map::new()));
                object.insert("outputs".to_string(), Value::Array(Vec::new()));
            }
        }
    }

    /// Write the document as JSON to `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(&self.root).context("Failed to serialize notebook")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write notebook {}", path.display()))
    }
}

fn is_code_cell(cell: &Value) -> bool {
    cell.get("cell_type").and_then(Value::as_str) == Some("code")
}

fn array_items(value: Option<&Value>) -> std::slice::Iter<'_, Value> {
    match value {
        Some(Value::Array(items)) => items.iter(),
        _ => Default::default(),
    }
}
