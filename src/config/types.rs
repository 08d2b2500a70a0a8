//! Config types for logfollow.
//!
//! Defines structures for parsing and representing configuration files.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::finder::default_search_dirs;
use crate::reader::{DEFAULT_POLL_INTERVAL, MAX_LINE_BYTES};

/// Default number of lines printed by `tail`.
pub const DEFAULT_NUM_LINES: u64 = 5;

/// Every key a config file may contain.
pub const KNOWN_KEYS: &[&str] = &[
    "search_dirs",
    "num_lines",
    "with_blanks",
    "with_filename",
    "max_line_bytes",
    "poll_interval_ms",
];

/// Raw config file structure (used for parsing).
///
/// This struct directly mirrors the YAML config file structure.
/// Unknown fields are rejected with an error.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    /// Directories searched for bare file patterns (may contain tilde).
    #[serde(default)]
    pub search_dirs: Vec<PathBuf>,
    pub num_lines: Option<u64>,
    pub with_blanks: Option<bool>,
    pub with_filename: Option<bool>,
    pub max_line_bytes: Option<usize>,
    pub poll_interval_ms: Option<u64>,
}

/// Search directory with expanded path and existence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDir {
    pub path: PathBuf,
    /// Whether the directory exists at load time.
    pub exists: bool,
}

/// Effective settings after merging global config, project config and
/// built-in defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Project dirs, then global dirs, then the built-in defaults.
    pub search_dirs: Vec<PathBuf>,
    pub num_lines: u64,
    pub with_blanks: bool,
    pub with_filename: bool,
    pub max_line_bytes: usize,
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_dirs: default_search_dirs(),
            num_lines: DEFAULT_NUM_LINES,
            with_blanks: false,
            with_filename: false,
            max_line_bytes: MAX_LINE_BYTES,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
