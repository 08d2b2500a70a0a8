//! Resolve a bare file pattern against a list of search directories.

use crate::pattern::{Pattern, SortOrder};
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::{is_separator, Path, PathBuf};
use std::sync::LazyLock;

/// Any rotated log file: `<base>-out...` or `<base>-error...`, capturing the
/// base and whatever follows the optional rotation number.
static ROTATED_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^.]+)-(?:out|error)(?:-\d+)?(.*)$").expect("rotated file regex must compile")
});

/// Search directories used when the config does not name any.
pub fn default_search_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from(".")];
    if let Some(home) = dirs::home_dir() {
        dirs.push(home.join(".pm2").join("logs"));
    }
    dirs
}

/// Looks up which directory holds the files for a pattern.
#[derive(Debug, Clone, Default)]
pub struct Finder {
    search_dirs: Vec<PathBuf>,
}

impl Finder {
    /// Directories that do not exist are dropped; order is kept.
    pub fn new<I, P>(search_dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut finder = Self::default();
        for dir in search_dirs {
            finder.push_search_dir(dir);
        }
        finder
    }

    pub fn push_search_dir(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        if dir.is_dir() && !self.search_dirs.contains(&dir) {
            self.search_dirs.push(dir);
        } else {
            tracing::debug!(dir = %dir.display(), "skipping search directory");
        }
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// The pattern in the first search directory that has matching files.
    ///
    /// A pattern that names a directory is taken as-is.
    pub fn find(&self, pattern: &str) -> Result<Pattern> {
        if has_directory(pattern) {
            return Pattern::new(pattern);
        }

        let mut last_error = None;
        for dir in &self.search_dirs {
            let candidate = in_dir(dir, pattern)?;
            match candidate.files(SortOrder::OldestFirst) {
                Ok(files) if !files.is_empty() => return Ok(candidate),
                Ok(_) => {}
                Err(e) => last_error = Some(e),
            }
        }

        match last_error {
            Some(e) => Err(e.into()),
            None => bail!("could not find files matching '{}'", pattern),
        }
    }

    /// The pattern in every search directory that has matching files, in
    /// search order.
    pub fn find_all(&self, pattern: &str) -> Result<Vec<Pattern>> {
        if has_directory(pattern) {
            return Ok(vec![Pattern::new(pattern)?]);
        }

        let mut found = Vec::new();
        for dir in &self.search_dirs {
            let candidate = in_dir(dir, pattern)?;
            if !candidate.files(SortOrder::OldestFirst)?.is_empty() {
                found.push(candidate);
            }
        }
        Ok(found)
    }

    /// Every log set present in the search directories, in search order and
    /// sorted within each directory.
    ///
    /// A directory that cannot be listed is logged and skipped; the error is
    /// returned only when nothing was found anywhere.
    pub fn discover(&self) -> Result<Vec<Pattern>> {
        let mut found = Vec::new();
        let mut last_error = None;

        for dir in &self.search_dirs {
            match patterns_in(dir) {
                Ok(names) => {
                    for name in names {
                        match in_dir(dir, &name) {
                            Ok(pattern) => found.push(pattern),
                            Err(e) => tracing::debug!(name = %name, error = %e, "skipping file name"),
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        dir = %dir.display(),
                        error = %e,
                        "failed to list search directory"
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if found.is_empty() => Err(e),
            _ => Ok(found),
        }
    }
}

/// Pattern names (`<base><rest>`) of the rotated files directly in `dir`.
fn patterns_in(dir: &Path) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        if !entry.file_type().is_ok_and(|t| t.is_file()) {
            continue;
        }
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if let Some(caps) = ROTATED_FILE.captures(file_name) {
            names.insert(format!("{}{}", &caps[1], &caps[2]));
        }
    }
    Ok(names)
}

fn has_directory(pattern: &str) -> bool {
    pattern.contains(is_separator)
}

fn in_dir(dir: &Path, pattern: &str) -> Result<Pattern> {
    Pattern::new(&dir.join(pattern).to_string_lossy())
}
