//! Capture configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Directory for trace files
pub const DIR_VAR: &str = "ZTRACE_DIR";
/// `0` or `false` turns off per-write fsync
pub const SYNC_VAR: &str = "ZTRACE_SYNC";
/// Log filter for the shim's own diagnostics
pub const LOG_VAR: &str = "ZTRACE_LOG";

/// Where and how traces are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Directory receiving `<kind>.<pid>.<sequence>` files
    pub output_dir: PathBuf,
    /// Fsync every append
    pub sync: bool,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            sync: true,
        }
    }
}

impl RecordConfig {
    /// Read the configuration from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var_os(DIR_VAR).map(PathBuf::from),
            std::env::var(SYNC_VAR).ok().as_deref(),
        )
    }

    fn from_vars(dir: Option<PathBuf>, sync: Option<&str>) -> Self {
        let defaults = Self::default();
        Self {
            output_dir: dir
                .filter(|d| !d.as_os_str().is_empty())
                .unwrap_or(defaults.output_dir),
            sync: sync.map_or(defaults.sync, parse_flag),
        }
    }

    /// Set the output directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Turn fsync on or off
    #[must_use]
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}
