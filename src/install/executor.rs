//! Low-level command execution for install commands

use anyhow::{Context, Result};
use std::process::{Command, Stdio};
use std::time::Instant;

use super::result::InstallCommandResult;
use crate::process::wait_with_output;

/// Run a single install command and capture its output
///
/// The command string is split on whitespace; the first token is the
/// program. Returns an error only when the command cannot be run at all
/// (empty command, spawn or wait failure). A nonzero exit is a normal
/// result with `success == false`.
pub fn run_install_command(command: &str) -> Result<InstallCommandResult> {
    let start = Instant::now();

    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .with_context(|| format!("Install command is empty: {command:?}"))?;

    let child = Command::new(program)
        .args(parts)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to spawn install command: {command}"))?;

    let (status, output) = wait_with_output(child)
        .with_context(|| format!("Failed to wait for install command: {command}"))?;

    Ok(InstallCommandResult {
        command: command.to_string(),
        success: status.success(),
        stdout: output.stdout,
        stderr: output.stderr,
        exit_code: status.code(),
        duration: start.elapsed(),
    })
}
