//! Subcommand runners for logfollow.

pub mod cat;
pub mod config;
pub mod find;
pub mod tac;
pub mod tail;
pub mod which;

use crate::cli::OutputArgs;
use anyhow::Result;
use logfollow::config::Config;
use logfollow::finder::Finder;
use logfollow::pattern::Pattern;
use logfollow::printer::PrintOptions;
use logfollow::reader::FileStreamer;
use logfollow::CancelToken;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Resolve a file pattern against the configured search directories.
fn resolve(config: &Config, pattern: &str) -> Result<Pattern> {
    let finder = Finder::new(config.search_dirs.iter().cloned());
    let pattern = finder.find(pattern)?;
    tracing::debug!(glob = %pattern.which(), "resolved file pattern");
    Ok(pattern)
}

/// Command-line flags switch options on; config can switch them on too.
fn print_options(config: &Config, output: &OutputArgs) -> PrintOptions {
    PrintOptions {
        with_blanks: output.with_blanks || config.with_blanks,
        with_filename: output.with_filename || config.with_filename,
        pretty: output.pretty,
        color: output.color,
    }
}

fn streamer(config: &Config, cancel: CancelToken) -> FileStreamer {
    FileStreamer::new(cancel).with_max_line_len(config.max_line_bytes)
}

fn is_compressed(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Drops compressed files, which cannot be read backwards or resumed.
/// Each skipped path is reported once.
#[derive(Debug, Default)]
struct SkipCompressed {
    warned: HashSet<PathBuf>,
}

impl SkipCompressed {
    fn keep(&mut self, path: &Path) -> bool {
        if !is_compressed(path) {
            return true;
        }
        if self.warned.insert(path.to_path_buf()) {
            tracing::warn!(path = %path.display(), "skipping compressed file");
        }
        false
    }
}
