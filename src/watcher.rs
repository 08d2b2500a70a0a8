//! Polling discovery of new files in a rotated set.

use crate::pattern::{Pattern, SortOrder};
use crate::reader::FileDiscovery;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

/// Remembers which files of a pattern it has already reported.
///
/// The seen set only grows; it stays small unless a very large number of
/// rotated files appear over the lifetime of a follow.
#[derive(Debug)]
pub struct Watcher {
    pattern: Pattern,
    seen: HashSet<PathBuf>,
    new_files: Vec<PathBuf>,
    last_file: Option<PathBuf>,
    prev_last_file: Option<PathBuf>,
}

impl Watcher {
    pub fn new(pattern: Pattern) -> Self {
        Self {
            pattern,
            seen: HashSet::new(),
            new_files: Vec::new(),
            last_file: None,
            prev_last_file: None,
        }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// List the directory once and record files not seen before.
    pub fn scan(&mut self) -> io::Result<()> {
        self.new_files.clear();
        self.prev_last_file = self.last_file.clone();

        for path in self.pattern.files(SortOrder::OldestFirst)? {
            if self.seen.insert(path.clone()) {
                tracing::debug!(path = %path.display(), "discovered file");
                self.last_file = Some(path.clone());
                self.new_files.push(path);
            }
        }
        Ok(())
    }

    /// Files first seen by the latest scan, oldest first.
    pub fn new_files(&self) -> &[PathBuf] {
        &self.new_files
    }

    /// Newest file discovered by the latest scan, if it discovered any.
    pub fn last_new_file(&self) -> Option<&Path> {
        self.new_files.last().map(PathBuf::as_path)
    }

    /// The active file from the scan before the latest, followed by the
    /// files the latest scan discovered.
    pub fn seen_this_time(&self) -> Vec<PathBuf> {
        self.prev_last_file
            .iter()
            .chain(self.new_files.iter())
            .cloned()
            .collect()
    }
}

impl FileDiscovery for Watcher {
    fn poll(&mut self) -> io::Result<Vec<PathBuf>> {
        self.scan()?;
        Ok(self.seen_this_time())
    }
}
