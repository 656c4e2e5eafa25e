//! Run configuration.
//!
//! Built-in defaults, optionally overlaid by a TOML file, optionally overlaid by
//! individual command-line flags.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default budget for a single script (60 seconds)
pub const DEFAULT_SCRIPT_TIMEOUT_SECS: u64 = 60;

/// Base budget for a notebook, before per-cell allowance (120 seconds)
pub const DEFAULT_NOTEBOOK_BASE_TIMEOUT_SECS: u64 = 120;

/// Additional notebook budget granted per cell (60 seconds)
pub const DEFAULT_NOTEBOOK_CELL_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_INTERPRETER: &str = "python3";
pub const DEFAULT_KERNEL_NAME: &str = "python3";
pub const DEFAULT_DEPENDENCY_DELIMITER: &str = ",";

/// Wall-clock budgets for artifact execution.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimeoutPolicy {
    pub script_secs: u64,
    pub notebook_base_secs: u64,
    pub notebook_per_cell_secs: u64,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            script_secs: DEFAULT_SCRIPT_TIMEOUT_SECS,
            notebook_base_secs: DEFAULT_NOTEBOOK_BASE_TIMEOUT_SECS,
            notebook_per_cell_secs: DEFAULT_NOTEBOOK_CELL_TIMEOUT_SECS,
        }
    }
}

impl TimeoutPolicy {
    pub fn script_budget(&self) -> Duration {
        Duration::from_secs(self.script_secs)
    }

    /// Budget for a notebook with `cell_count` cells.
    ///
    /// Scales with document size, counting every cell (code or not).
    pub fn notebook_budget(&self, cell_count: usize) -> Duration {
        let per_cell = self
            .notebook_per_cell_secs
            .saturating_mul(cell_count as u64);
        Duration::from_secs(self.notebook_base_secs.saturating_add(per_cell))
    }
}

/// Which runtime executes artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Interpreter program, resolved on `PATH`
    pub interpreter: String,
    /// Kernel used to execute notebook cells
    pub kernel_name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            interpreter: DEFAULT_INTERPRETER.to_string(),
            kernel_name: DEFAULT_KERNEL_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub timeouts: TimeoutPolicy,
    pub runtime: RuntimeConfig,
    /// Separator between install commands in the dependency argument
    pub dependency_delimiter: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            timeouts: TimeoutPolicy::default(),
            runtime: RuntimeConfig::default(),
            dependency_delimiter: DEFAULT_DEPENDENCY_DELIMITER.to_string(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from a TOML file; absent keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Split the raw dependency argument into the install plan.
    ///
    /// Entries are trimmed and empty entries discarded.
    pub fn parse_dependencies(&self, raw: &str) -> Vec<String> {
        raw.split(self.dependency_delimiter.as_str())
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from)
            .collect()
    }
}
