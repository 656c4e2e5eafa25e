//! Python runtime backed by the interpreter on `PATH`.
//!
//! Three small Python programs are embedded in the binary and written to a
//! private temporary directory the first time a command is built:
//!
//! - `run_script.py` runs a script as `__main__` and writes the failure report
//! - `run_notebook.py` executes a notebook with nbclient
//! - `exception_handler.py` is an IPython extension loaded into the kernel
//!   that serializes tracebacks as JSON frames
//!
//! The directory lives as long as the runtime.

use anyhow::{Context, Result};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use tempfile::TempDir;
use tracing::debug;

use super::Runtime;
use crate::config::RuntimeConfig;

const RUN_SCRIPT: &str = include_str!("python/run_script.py");
const RUN_NOTEBOOK: &str = include_str!("python/run_notebook.py");
const EXCEPTION_HANDLER: &str = include_str!("python/exception_handler.py");

/// Path fragments identifying IPython's own frames in a kernel traceback.
const IPYTHON_MARKERS: &[&str] = &["/site-packages/IPython/", "/dist-packages/IPython/"];

struct Shims {
    // Keeps the directory alive; removed on drop.
    _dir: TempDir,
    dir: PathBuf,
    script_runner: PathBuf,
    notebook_runner: PathBuf,
}

impl Shims {
    fn materialize() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("snippet-validator-")
            .tempdir()
            .context("Failed to create runtime shim directory")?;
        let path = dir.path().to_path_buf();

        let script_runner = path.join("run_script.py");
        let notebook_runner = path.join("run_notebook.py");
        for (target, content) in [
            (&script_runner, RUN_SCRIPT),
            (&notebook_runner, RUN_NOTEBOOK),
            (&path.join("exception_handler.py"), EXCEPTION_HANDLER),
        ] {
            fs::write(target, content)
                .with_context(|| format!("Failed to write runtime shim {}", target.display()))?;
        }

        debug!(dir = %path.display(), "Runtime shims written");
        Ok(Self {
            _dir: dir,
            dir: path,
            script_runner,
            notebook_runner,
        })
    }
}

pub struct PythonRuntime {
    config: RuntimeConfig,
    shims: OnceLock<Shims>,
}

impl PythonRuntime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            shims: OnceLock::new(),
        }
    }

    fn shims(&self) -> Result<&Shims> {
        if let Some(shims) = self.shims.get() {
            return Ok(shims);
        }
        let shims = Shims::materialize()?;
        Ok(self.shims.get_or_init(|| shims))
    }

    fn interpreter(&self) -> Result<PathBuf> {
        which::which(&self.config.interpreter).with_context(|| {
            format!(
                "Python interpreter '{}' not found on PATH",
                self.config.interpreter
            )
        })
    }

    /// `PYTHONPATH` with the shim directory prepended, so the kernel can
    /// import the exception handler extension.
    fn python_path(&self, shim_dir: &Path) -> Result<OsString> {
        let mut paths = vec![shim_dir.to_path_buf()];
        if let Some(existing) = env::var_os("PYTHONPATH") {
            paths.extend(env::split_paths(&existing));
        }
        env::join_paths(paths).context("Failed to build PYTHONPATH")
    }
}

impl Runtime for PythonRuntime {
    fn name(&self) -> &str {
        &self.config.interpreter
    }

    fn script_command(&self, script: &Path, report: &Path) -> Result<Command> {
        let interpreter = self.interpreter()?;
        let shims = self.shims()?;

        let mut cmd = Command::new(interpreter);
        cmd.arg(&shims.script_runner).arg(script).arg(report);
        Ok(cmd)
    }

    fn notebook_command(&self, input: &Path, executed: &Path) -> Result<Command> {
        let interpreter = self.interpreter()?;
        let shims = self.shims()?;

        let mut cmd = Command::new(interpreter);
        cmd.arg(&shims.notebook_runner)
            .arg(input)
            .arg(executed)
            .arg(&self.config.kernel_name)
            .env("PYTHONPATH", self.python_path(&shims.dir)?);
        Ok(cmd)
    }

    fn is_harness_frame(&self, file: &str) -> bool {
        self.shims
            .get()
            .is_some_and(|shims| Path::new(file) == shims.script_runner)
    }

    fn is_engine_frame(&self, file: &str) -> bool {
        IPYTHON_MARKERS.iter().any(|marker| file.contains(marker))
    }
}
