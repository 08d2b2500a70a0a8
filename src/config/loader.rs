//! Config loading for logfollow.
//!
//! Loads and validates YAML config files with path expansion.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::discovery::DiscoveryResult;
use crate::config::error::ConfigError;
use crate::config::types::{Config, RawConfig, SearchDir};

/// Config loaded from a single file (for config commands).
///
/// Unlike [`Config`] this is not merged with anything: `config validate`
/// and `config show` use "closest config wins completely" semantics.
#[derive(Debug, Default)]
pub struct SingleFileConfig {
    pub search_dirs: Vec<SearchDir>,
    pub num_lines: Option<u64>,
    pub with_blanks: Option<bool>,
    pub with_filename: Option<bool>,
    pub max_line_bytes: Option<usize>,
    pub poll_interval_ms: Option<u64>,
}

/// Expand tilde in path to home directory.
///
/// Handles the following cases:
/// - `~/foo` -> `/home/user/foo`
/// - `/absolute/path` -> unchanged
/// - `relative/path` -> unchanged
pub fn expand_path(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();

    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path_str == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }

    path.to_path_buf()
}

/// Load, parse and validate a YAML config file.
fn load_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    // A file holding only comments is a valid, empty config
    let raw = if is_blank_yaml(&content) {
        RawConfig::default()
    } else {
        serde_saphyr::from_str(&content)
            .map_err(|e| ConfigError::from_saphyr_error(path.to_path_buf(), e))?
    };

    validate(path, &raw)?;
    Ok(raw)
}

fn is_blank_yaml(content: &str) -> bool {
    content.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---"
    })
}

fn validate(path: &Path, raw: &RawConfig) -> Result<(), ConfigError> {
    let invalid = |message: &str| ConfigError::Validation {
        path: path.to_path_buf(),
        message: message.to_string(),
    };

    if raw.max_line_bytes == Some(0) {
        return Err(invalid("max_line_bytes must be at least 1"));
    }
    if raw.poll_interval_ms == Some(0) {
        return Err(invalid("poll_interval_ms must be at least 1"));
    }
    Ok(())
}

fn expand_search_dirs(raw: &[PathBuf]) -> Vec<SearchDir> {
    raw.iter()
        .map(|dir| {
            let path = expand_path(dir);
            let exists = path.is_dir();
            SearchDir { path, exists }
        })
        .collect()
}

/// Load config from a single file (closest-wins semantics for config commands).
pub fn load_single_file(path: &Path) -> Result<SingleFileConfig, ConfigError> {
    let raw = load_file(path)?;
    Ok(SingleFileConfig {
        search_dirs: expand_search_dirs(&raw.search_dirs),
        num_lines: raw.num_lines,
        with_blanks: raw.with_blanks,
        with_filename: raw.with_filename,
        max_line_bytes: raw.max_line_bytes,
        poll_interval_ms: raw.poll_interval_ms,
    })
}

/// Load config from discovered config files.
///
/// Merges project and global configs:
/// - Scalars come from the project config, then the global config, then
///   built-in defaults
/// - Search directories are project dirs, then global dirs, then the
///   built-in defaults, without duplicates
///
/// Returns the defaults if no config files exist.
pub fn load(discovery: &DiscoveryResult) -> Result<Config, ConfigError> {
    let mut config = Config::default();
    let mut layers = Vec::new();

    // Project first: its values win
    if let Some(project_path) = &discovery.project_config {
        layers.push(load_file(project_path)?);
    }
    if let Some(global_path) = &discovery.global_config {
        layers.push(load_file(global_path)?);
    }

    let mut search_dirs: Vec<PathBuf> = layers
        .iter()
        .flat_map(|raw| expand_search_dirs(&raw.search_dirs))
        .map(|dir| dir.path)
        .collect();
    for dir in std::mem::take(&mut config.search_dirs) {
        search_dirs.push(dir);
    }
    let mut seen = std::collections::HashSet::new();
    search_dirs.retain(|dir| seen.insert(dir.clone()));
    config.search_dirs = search_dirs;

    for raw in layers.iter().rev() {
        if let Some(n) = raw.num_lines {
            config.num_lines = n;
        }
        if let Some(b) = raw.with_blanks {
            config.with_blanks = b;
        }
        if let Some(b) = raw.with_filename {
            config.with_filename = b;
        }
        if let Some(n) = raw.max_line_bytes {
            config.max_line_bytes = n;
        }
        if let Some(ms) = raw.poll_interval_ms {
            config.poll_interval = Duration::from_millis(ms);
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::DEFAULT_NUM_LINES;
    use crate::finder::default_search_dirs;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_expand_path_tilde() {
        let path = Path::new("~/logs/app.log");
        let expanded = expand_path(path);

        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join("logs/app.log"));
        } else {
            assert_eq!(expanded.to_string_lossy(), "~/logs/app.log");
        }
    }

    #[test]
    fn test_expand_path_absolute() {
        let path = Path::new("/var/log/app.log");
        assert_eq!(expand_path(path), PathBuf::from("/var/log/app.log"));
    }

    #[test]
    fn test_expand_path_relative() {
        let path = Path::new("logs/app.log");
        assert_eq!(expand_path(path), PathBuf::from("logs/app.log"));
    }

    #[test]
    fn test_load_empty_discovery() {
        let config = load(&DiscoveryResult::default()).unwrap();

        assert_eq!(config.num_lines, DEFAULT_NUM_LINES);
        assert!(!config.with_blanks);
        assert_eq!(config.search_dirs, default_search_dirs());
    }

    #[test]
    fn test_load_project_config() {
        let temp = TempDir::new().unwrap();
        let logs = temp.path().join("logs");
        fs::create_dir(&logs).unwrap();
        let config_path = write_config(
            temp.path(),
            "logfollow.yaml",
            &format!(
                "search_dirs:\n  - {}\nnum_lines: 20\nwith_filename: true\npoll_interval_ms: 250\n",
                logs.display()
            ),
        );

        let config = load(&DiscoveryResult {
            project_config: Some(config_path),
            global_config: None,
        })
        .unwrap();

        assert_eq!(config.num_lines, 20);
        assert!(config.with_filename);
        assert!(!config.with_blanks);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.search_dirs[0], logs);
        assert_eq!(&config.search_dirs[1..], default_search_dirs().as_slice());
    }

    #[test]
    fn test_load_both_configs() {
        let temp = TempDir::new().unwrap();
        let project = write_config(
            temp.path(),
            "logfollow.yaml",
            "search_dirs: [/project/logs]\nnum_lines: 7\n",
        );
        let global = write_config(
            temp.path(),
            "config.yaml",
            "search_dirs: [/global/logs, /project/logs]\nnum_lines: 9\nwith_blanks: true\n",
        );

        let config = load(&DiscoveryResult {
            project_config: Some(project),
            global_config: Some(global),
        })
        .unwrap();

        // Project scalar wins, global fills the gaps
        assert_eq!(config.num_lines, 7);
        assert!(config.with_blanks);
        assert_eq!(
            &config.search_dirs[..2],
            &[PathBuf::from("/project/logs"), PathBuf::from("/global/logs")]
        );
        assert_eq!(config.search_dirs.len(), 2 + default_search_dirs().len());
    }

    #[test]
    fn test_load_comment_only_yaml() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "logfollow.yaml", "# nothing yet\n");

        let cfg = load_single_file(&path).unwrap();

        assert!(cfg.search_dirs.is_empty());
        assert_eq!(cfg.num_lines, None);
    }

    #[test]
    fn test_load_unknown_field_error() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "logfollow.yaml", "num_line: 3\n");

        let err = load_single_file(&path).unwrap_err();
        let display = err.to_string();

        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(display.contains(&path.to_string_lossy().to_string()));
        assert!(display.contains("num_line"));
        assert!(display.contains("num_lines"));
    }

    #[test]
    fn test_zero_max_line_bytes_is_invalid() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "logfollow.yaml", "max_line_bytes: 0\n");

        let err = load_single_file(&path).unwrap_err();

        assert!(matches!(err, ConfigError::Validation { .. }));
        assert!(err.to_string().contains("max_line_bytes"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = load_single_file(&temp.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_search_dir_existence_check() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            temp.path(),
            "logfollow.yaml",
            &format!(
                "search_dirs:\n  - {}\n  - /nonexistent/logs\n",
                temp.path().display()
            ),
        );

        let cfg = load_single_file(&path).unwrap();

        assert!(cfg.search_dirs[0].exists);
        assert!(!cfg.search_dirs[1].exists);
    }
}
