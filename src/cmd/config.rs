//! Config validate and show commands for logfollow.
//!
//! Provides config introspection and validation for CI pipelines and developer debugging.

use colored::Colorize;
use logfollow::config::{self, SearchDir, SingleFileConfig};
use std::fmt::Display;
use std::path::PathBuf;

/// Get the effective config path (closest wins: project > global).
///
/// Config commands use "closest config wins completely" semantics:
/// - If project config exists (logfollow.yaml found in cwd or parent), use it exclusively
/// - Otherwise, fall back to the global config
/// - If neither exists, return None
fn effective_config_path() -> Option<PathBuf> {
    config::discover().closest().map(PathBuf::from)
}

/// Validate the effective config file.
///
/// Follows Unix conventions:
/// - Exit 0 with no output on success (quiet success)
/// - Exit 1 with error message to stderr on failure
///
/// Validates:
/// - YAML syntax
/// - Known field names (typo detection)
/// - Value ranges
/// - Search directory existence
pub fn validate() -> Result<(), i32> {
    let config_path = match effective_config_path() {
        Some(path) => path,
        None => {
            eprintln!("error: No config found to validate");
            return Err(1);
        }
    };

    match config::load_single_file(&config_path) {
        Ok(cfg) => {
            let mut has_errors = false;
            for dir in cfg.search_dirs.iter().filter(|dir| !dir.exists) {
                eprintln!("error: Search directory not found: {}", dir.path.display());
                has_errors = true;
            }
            if has_errors {
                Err(1)
            } else {
                Ok(())
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            Err(1)
        }
    }
}

/// Show the effective configuration.
///
/// Respects NO_COLOR environment variable via the colored crate.
pub fn show() -> Result<(), i32> {
    match effective_config_path() {
        Some(path) => match config::load_single_file(&path) {
            Ok(cfg) => {
                println!("Using: {}", path.display().to_string().dimmed());
                println!();
                show_config(&cfg);
                Ok(())
            }
            Err(e) => {
                eprintln!("{}", e);
                Err(1)
            }
        },
        None => {
            println!("{}", "No config found. Using defaults.".dimmed());
            println!();
            show_config(&SingleFileConfig::default());
            Ok(())
        }
    }
}

/// Display the config contents with colored output.
fn show_config(cfg: &SingleFileConfig) {
    show_value("num_lines", cfg.num_lines);
    show_value("with_blanks", cfg.with_blanks);
    show_value("with_filename", cfg.with_filename);
    show_value("max_line_bytes", cfg.max_line_bytes);
    show_value("poll_interval_ms", cfg.poll_interval_ms);

    println!();
    if cfg.search_dirs.is_empty() {
        println!("{}", "(no search_dirs defined, using . and ~/.pm2/logs)".dimmed());
    } else {
        println!("{}:", "search_dirs".cyan());
        for dir in &cfg.search_dirs {
            show_search_dir(dir);
        }
    }
}

fn show_value<T: Display>(key: &str, value: Option<T>) {
    match value {
        Some(v) => println!("{}: {}", key.cyan(), v.to_string().green()),
        None => println!("{}: {}", key.cyan(), "(default)".dimmed()),
    }
}

fn show_search_dir(dir: &SearchDir) {
    let status = if dir.exists {
        String::new()
    } else {
        format!(" {}", "(not found)".red())
    };
    println!(
        "  - {}{}",
        dir.path.display().to_string().yellow(),
        status
    );
}
