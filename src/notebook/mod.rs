//! Notebook documents: schema handling before execution and failure location
//! after it.

mod document;
mod failure;

pub use document::{NotebookDocument, NotebookVersion, SUPPORTED_LANGUAGE};
pub use failure::{
    decode_traceback, locate_failure, CellOutput, CellSource, ExecutedCell, ExecutedNotebook,
};
