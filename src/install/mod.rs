//! Dependency Installation Module
//!
//! Runs the install plan for one validation run: an ordered list of install
//! command strings, executed one after another.
//!
//! # Execution Model
//!
//! - Each command string is split on whitespace into a program and its
//!   arguments. No shell is involved.
//! - Commands run sequentially with stdout/stderr captured as text.
//! - No timeout is applied. Installs are expected to be short relative to the
//!   execution budget.
//! - A command that exits nonzero is recorded as a failure and the remaining
//!   commands still run (fail-fast is never applied).
//! - A command that cannot be spawned at all is an installer fault: the
//!   outcome becomes `UnknownException` and the remaining commands are skipped.

mod executor;
mod result;
mod runner;


pub use executor::run_install_command;
pub use result::InstallCommandResult;
pub use runner::run_install_commands;
