//! Config error types for logfollow.
//!
//! Provides rich error messages with file locations and typo suggestions.

use std::fmt;
use std::path::PathBuf;

use regex::Regex;
use strsim::jaro_winkler;

use crate::config::types::KNOWN_KEYS;

const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Error loading or parsing a config file.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading the config file.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// YAML parse error.
    Parse {
        path: PathBuf,
        message: String,
        line: Option<usize>,
        column: Option<usize>,
        suggestion: Option<String>,
    },

    /// Validation error (semantic errors after parsing).
    Validation { path: PathBuf, message: String },
}

impl ConfigError {
    /// Build a parse error from a serde-saphyr error, pulling out the
    /// location and suggesting a key when the error names an unknown field.
    pub fn from_saphyr_error(path: PathBuf, error: serde_saphyr::Error) -> Self {
        let message = error.to_string();
        let (line, column) = location_of(&message);
        let suggestion = unknown_field(&message).and_then(|field| suggest_key(&field));

        ConfigError::Parse {
            path,
            message: first_line(&message),
            line,
            column,
            suggestion,
        }
    }

    /// Format error in Cargo-style format.
    pub fn format_cargo_style(&self) -> String {
        match self {
            ConfigError::Io { path, source } => {
                format!(
                    "error: cannot read config file\n  --> {}\n  |\n  = {}\n",
                    path.display(),
                    source
                )
            }
            ConfigError::Parse {
                path,
                message,
                line,
                column,
                suggestion,
            } => {
                let location = match (line, column) {
                    (Some(l), Some(c)) => format!("{}:{}:{}", path.display(), l, c),
                    (Some(l), None) => format!("{}:{}", path.display(), l),
                    _ => format!("{}", path.display()),
                };
                let mut output = format!("error: {}\n  --> {}\n  |\n", message, location);
                if let Some(suggestion) = suggestion {
                    output.push_str(&format!("  = help: did you mean `{}`?\n", suggestion));
                }
                output
            }
            ConfigError::Validation { path, message } => {
                format!("error: {}\n  --> {}\n  |\n", message, path.display())
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_cargo_style())
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// The closest known config key to `field`, if any is close enough.
pub fn suggest_key(field: &str) -> Option<String> {
    KNOWN_KEYS
        .iter()
        .filter(|&&known| jaro_winkler(field, known) >= SIMILARITY_THRESHOLD)
        .max_by(|a, b| {
            jaro_winkler(field, a)
                .partial_cmp(&jaro_winkler(field, b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|&s| s.to_string())
}

/// Field name from serde's "unknown field `x`" message.
fn unknown_field(message: &str) -> Option<String> {
    let rest = &message[message.find("unknown field `")? + "unknown field `".len()..];
    rest.find('`').map(|end| rest[..end].to_string())
}

fn location_of(message: &str) -> (Option<usize>, Option<usize>) {
    let Ok(re) = Regex::new(r"line (\d+),? column (\d+)") else {
        return (None, None);
    };
    match re.captures(message) {
        Some(caps) => (
            caps.get(1).and_then(|m| m.as_str().parse().ok()),
            caps.get(2).and_then(|m| m.as_str().parse().ok()),
        ),
        None => (None, None),
    }
}

fn first_line(message: &str) -> String {
    message.lines().next().unwrap_or(message).trim().to_string()
}
