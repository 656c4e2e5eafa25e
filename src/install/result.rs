//! Result types for install command execution

use std::time::Duration;

use crate::models::InstallError;

/// Result of executing a single install command
#[derive(Debug, Clone)]
pub struct InstallCommandResult {
    pub command: String,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub duration: Duration,
}

impl InstallCommandResult {
    /// Check if the command succeeded
    pub fn passed(&self) -> bool {
        self.success
    }

    /// Get a summary of the result
    pub fn summary(&self) -> String {
        let status = if self.success { "INSTALLED" } else { "FAILED" };
        format!(
            "{} - {} ({}ms, exit code: {:?})",
            status,
            self.command,
            self.duration.as_millis(),
            self.exit_code
        )
    }

    /// The failure entry reported for this command
    pub fn to_install_error(&self) -> InstallError {
        InstallError {
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        }
    }
}
