//! The execution capability the executors delegate to.
//!
//! The harness never runs artifact code in its own process. A `Runtime`
//! builds the child commands that do, and tells the executors which stack
//! frames belong to its own machinery rather than to the artifact.

use anyhow::Result;
use std::path::Path;
use std::process::Command;

mod python;

pub use python::PythonRuntime;

/// Exit status of a notebook command when a cell raised.
pub const CELL_FAILURE_EXIT: i32 = 3;

pub trait Runtime {
    /// Human-readable name used in logs
    fn name(&self) -> &str;

    /// Command that compiles `script` as one unit and runs it as the main
    /// module.
    ///
    /// On an uncaught failure it must write a JSON failure report (see
    /// `exception::RawFailure`) to `report` and exit nonzero. It must not
    /// write `report` otherwise.
    fn script_command(&self, script: &Path, report: &Path) -> Result<Command>;

    /// Command that executes the notebook at `input` cell by cell and writes
    /// the executed v4 document to `executed`.
    ///
    /// Exits zero when every cell ran, `CELL_FAILURE_EXIT` when a cell
    /// raised. Error outputs carry a traceback of JSON-encoded
    /// `[file, line, scope, text]` frames.
    fn notebook_command(&self, input: &Path, executed: &Path) -> Result<Command>;

    /// Whether a frame in a script failure belongs to the script shim
    fn is_harness_frame(&self, file: &str) -> bool;

    /// Whether a frame in a notebook traceback belongs to the kernel machinery
    fn is_engine_frame(&self, file: &str) -> bool;
}
