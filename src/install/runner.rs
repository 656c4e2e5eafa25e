//! Install plan runner

use tracing::{error, info, info_span, Span};

use super::executor::run_install_command;
use crate::models::{ExceptionRecord, InstallOutcome};

/// Run every install command in order and fold the results
///
/// Never fails: command failures are collected, and an installer fault is
/// reported as an `UnknownException` outcome carrying the failures seen
/// before it.
pub fn run_install_commands(commands: &[String], parent: &Span) -> InstallOutcome {
    let span = info_span!(parent: parent, "install", commands = commands.len());
    let _entered = span.enter();

    info!("Executing run commands to install dependencies");

    let mut failures = Vec::new();

    for command in commands {
        info!(command = %command, "Executing install command");

        let result = match run_install_command(command) {
            Ok(result) => result,
            Err(e) => {
                error!("Unknown error on install: {e:#}");
                return InstallOutcome::fault(failures, ExceptionRecord::from_fault(&e));
            }
        };

        info!("{}", result.summary());
        if !result.passed() {
            info!("Install failed. Stdout:\n{}", result.stdout);
            info!("Install failed. Stderr:\n{}", result.stderr);
            failures.push(result.to_install_error());
        }
    }

    InstallOutcome::from_failures(failures)
}
