//! Artifact references and directory-entrypoint inference.
//!
//! A snippet path may name a file directly or a directory. A directory is
//! resolved to an entrypoint in one of two cases:
//!
//! 1. It holds exactly one recognized file.
//! 2. It holds a `__main__.py`.
//!
//! Anything else is ambiguous and rejected.

use anyhow::{Context, Result};
use glob::{glob_with, MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::HarnessError;

/// Conventional main-module file name for script directories.
pub const MAIN_MODULE: &str = "__main__.py";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetKind {
    Script,
    Notebook,
}

impl SnippetKind {
    pub const ALL: [SnippetKind; 2] = [SnippetKind::Script, SnippetKind::Notebook];

    pub fn extension(self) -> &'static str {
        match self {
            SnippetKind::Script => "py",
            SnippetKind::Notebook => "ipynb",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        Self::ALL.into_iter().find(|kind| kind.extension() == ext)
    }
}

/// A resolved artifact: an absolute path to a recognized file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub path: PathBuf,
    pub kind: SnippetKind,
}

impl Snippet {
    /// Resolve `path` to a concrete entrypoint.
    pub fn resolve(path: &Path) -> Result<Self> {
        let path = std::path::absolute(path)
            .with_context(|| format!("Failed to resolve snippet path {}", path.display()))?;

        let entrypoint = if path.is_dir() {
            infer_entrypoint(&path)?
        } else {
            path
        };

        let kind = SnippetKind::from_path(&entrypoint).ok_or_else(|| {
            HarnessError::UnsupportedFileType(
                entrypoint
                    .extension()
                    .map(|e| format!(".{}", e.to_string_lossy()))
                    .unwrap_or_else(|| entrypoint.display().to_string()),
            )
        })?;

        info!(snippet = %entrypoint.display(), ?kind, "Running tests on snippet");
        Ok(Self {
            path: entrypoint,
            kind,
        })
    }
}

fn infer_entrypoint(dir: &Path) -> Result<PathBuf> {
    info!(dir = %dir.display(), "Snippet path is a directory, searching for files");

    let files = recognized_files(dir)?;
    info!(files = ?files, "Candidate entrypoints");

    if let [single] = files.as_slice() {
        info!("Found exactly one file");
        return Ok(single.clone());
    }

    let has_main = files
        .iter()
        .any(|f| f.file_name().is_some_and(|name| name == MAIN_MODULE));
    if has_main {
        info!("Found a main module");
        return Ok(dir.join(MAIN_MODULE));
    }

    Err(HarnessError::NoEntrypoint(dir.to_path_buf()).into())
}

/// Recognized files directly inside `dir`, scripts first, each group sorted.
///
/// Hidden files (editor locks, AppleDouble `._*` companions) are never
/// candidates.
fn recognized_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let escaped = Pattern::escape(&dir.to_string_lossy());
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };
    let mut files = Vec::new();

    for kind in SnippetKind::ALL {
        let pattern = format!("{escaped}/*.{}", kind.extension());
        let mut matches: Vec<PathBuf> = glob_with(&pattern, options)
            .map_err(|e| anyhow::anyhow!("Invalid glob pattern '{pattern}': {e}"))?
            .filter_map(|r| r.ok())
            .collect();
        matches.sort();
        files.extend(matches);
    }

    Ok(files)
}
