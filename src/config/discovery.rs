//! Config discovery for logfollow.
//!
//! Walks parent directories to find `logfollow.yaml` and checks for global
//! config at `<config dir>/logfollow/config.yaml`.

use std::path::{Path, PathBuf};

/// Project config filename to search for in parent directories.
pub const PROJECT_CONFIG_NAME: &str = "logfollow.yaml";

/// Global config filename within the logfollow config directory.
pub const GLOBAL_CONFIG_NAME: &str = "config.yaml";

/// Result of config discovery.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryResult {
    /// Full path to the project config file (`logfollow.yaml`).
    pub project_config: Option<PathBuf>,
    /// Full path to the global config file.
    pub global_config: Option<PathBuf>,
}

impl DiscoveryResult {
    /// Returns true if any config was found (project or global).
    pub fn has_config(&self) -> bool {
        self.project_config.is_some() || self.global_config.is_some()
    }

    /// The config that wins outright for `config show|validate`.
    pub fn closest(&self) -> Option<&Path> {
        self.project_config
            .as_deref()
            .or(self.global_config.as_deref())
    }
}

/// Discover config files starting from the current working directory.
pub fn discover() -> DiscoveryResult {
    discover_verbose().0
}

/// Same as [`discover`] but also returns every directory that was checked
/// for a project config.
pub fn discover_verbose() -> (DiscoveryResult, Vec<PathBuf>) {
    let global_dir = dirs::config_dir().map(|d| d.join("logfollow"));

    match std::env::current_dir() {
        Ok(dir) => {
            let cwd = dir.canonicalize().unwrap_or(dir);
            discover_from(&cwd, global_dir.as_deref())
        }
        Err(_) => {
            let result = DiscoveryResult {
                project_config: None,
                global_config: global_dir.and_then(|d| existing_file(d.join(GLOBAL_CONFIG_NAME))),
            };
            (result, Vec::new())
        }
    }
}

/// Discovery rooted at `start`, with the global config looked up in
/// `global_dir`.
pub fn discover_from(start: &Path, global_dir: Option<&Path>) -> (DiscoveryResult, Vec<PathBuf>) {
    let mut result = DiscoveryResult {
        global_config: global_dir.and_then(|dir| existing_file(dir.join(GLOBAL_CONFIG_NAME))),
        ..Default::default()
    };
    let mut searched_paths = Vec::new();

    for ancestor in start.ancestors() {
        searched_paths.push(ancestor.to_path_buf());

        if let Some(config_path) = existing_file(ancestor.join(PROJECT_CONFIG_NAME)) {
            result.project_config = Some(config_path);
            break;
        }
    }

    (result, searched_paths)
}

fn existing_file(path: PathBuf) -> Option<PathBuf> {
    (path.try_exists().unwrap_or(false) && path.is_file()).then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_finds_config_in_start_dir() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join(PROJECT_CONFIG_NAME);
        fs::write(&config_path, "num_lines: 3\n").unwrap();

        let (result, searched) = discover_from(temp.path(), None);

        assert_eq!(result.project_config, Some(config_path));
        assert_eq!(searched, vec![temp.path().to_path_buf()]);
    }

    #[test]
    fn test_finds_config_in_parent_dir() {
        let temp = TempDir::new().unwrap();
        let subdir = temp.path().join("a").join("b");
        fs::create_dir_all(&subdir).unwrap();
        let config_path = temp.path().join(PROJECT_CONFIG_NAME);
        fs::write(&config_path, "num_lines: 3\n").unwrap();

        let (result, searched) = discover_from(&subdir, None);

        assert_eq!(result.project_config, Some(config_path));
        assert_eq!(searched.len(), 3);
        assert_eq!(searched[0], subdir);
    }

    #[test]
    fn test_global_config() {
        let temp = TempDir::new().unwrap();
        let global_dir = temp.path().join("global");
        fs::create_dir(&global_dir).unwrap();
        fs::write(global_dir.join(GLOBAL_CONFIG_NAME), "with_blanks: true\n").unwrap();
        let project = temp.path().join("project");
        fs::create_dir(&project).unwrap();

        let (result, _) = discover_from(&project, Some(&global_dir));

        assert_eq!(result.global_config, Some(global_dir.join(GLOBAL_CONFIG_NAME)));
        assert!(result.has_config());
        assert_eq!(result.closest(), result.global_config.as_deref());
    }

    #[test]
    fn test_directory_named_like_config_is_ignored() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(PROJECT_CONFIG_NAME)).unwrap();

        let (result, _) = discover_from(temp.path(), None);

        assert_ne!(result.project_config, Some(temp.path().join(PROJECT_CONFIG_NAME)));
    }

    #[test]
    fn test_closest_prefers_project() {
        let result = DiscoveryResult {
            project_config: Some(PathBuf::from("/p/logfollow.yaml")),
            global_config: Some(PathBuf::from("/home/u/.config/logfollow/config.yaml")),
        };
        assert_eq!(result.closest(), Some(Path::new("/p/logfollow.yaml")));

        assert!(!DiscoveryResult::default().has_config());
        assert_eq!(DiscoveryResult::default().closest(), None);
    }
}
