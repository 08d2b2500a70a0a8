//! File patterns for rotated log sets.
//!
//! A pattern like `logs/api.log` describes every file in `logs/` named
//! `api-out.log`, `api-error.log`, `api-out-3.log`, and so on.

use anyhow::{bail, Context, Result};
use regex::Regex;
use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{is_separator, Path, PathBuf};

/// Order in which [`Pattern::files`] returns matching files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    OldestFirst,
    NewestFirst,
}

/// A compiled file pattern bound to one directory.
#[derive(Debug, Clone)]
pub struct Pattern {
    original: String,
    directory: PathBuf,
    base: String,
    extension: Option<String>,
    regex: Regex,
}

impl Pattern {
    /// Parse `[<dir>/]<base>[-][.<ext>]`.
    ///
    /// The directory defaults to the current one and is made absolute.
    /// Everything after the first `.` of the file name is the required
    /// extension; without one, any extension (or none) matches.
    pub fn new(pattern: &str) -> Result<Self> {
        let (dir, name) = match pattern.rfind(is_separator) {
            Some(i) => (&pattern[..=i], &pattern[i + 1..]),
            None => ("", pattern),
        };

        let (base, extension) = match name.find('.') {
            Some(i) => (&name[..i], Some(&name[i + 1..]).filter(|ext| !ext.is_empty())),
            None => (name, None),
        };
        let base = base.trim_end_matches('-');
        if base.is_empty() {
            bail!("file pattern '{}' has no base name", pattern);
        }

        let directory = std::path::absolute(if dir.is_empty() { "." } else { dir })
            .with_context(|| format!("Failed to resolve directory of '{}'", pattern))?;

        let regex = match extension {
            Some(ext) => format!(
                r"^{}-(out|error)(?:-(\d+))?(?:\.{})$",
                regex::escape(base),
                regex::escape(ext)
            ),
            None => format!(r"^{}-(out|error)(?:-(\d+))?(?:\..+)?$", regex::escape(base)),
        };
        let regex = Regex::new(&regex).context("Failed to compile file pattern")?;

        Ok(Self {
            original: pattern.to_string(),
            directory,
            base: base.to_string(),
            extension: extension.map(str::to_string),
            regex,
        })
    }

    /// The string this pattern was parsed from.
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// A glob describing the files this pattern picks up.
    pub fn which(&self) -> String {
        let glob = match &self.extension {
            Some(ext) => format!("{}-*.{}", self.base, ext),
            None => format!("{}-*.*", self.base),
        };
        self.directory.join(glob).display().to_string()
    }

    /// Whether a bare file name belongs to this pattern.
    pub fn matches(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }

    /// Matching regular files in the pattern directory (not recursive).
    ///
    /// Oldest-first is natural order of the file names: numbered rotations
    /// ascend, and the unnumbered live file sorts after them.
    pub fn files(&self, order: SortOrder) -> io::Result<Vec<PathBuf>> {
        let mut names = Vec::new();

        for entry in fs::read_dir(&self.directory)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if self.matches(&name) && entry.path().is_file() {
                names.push(name);
            }
        }

        names.sort_by(|a, b| natural_cmp(a, b));
        if order == SortOrder::NewestFirst {
            names.reverse();
        }

        Ok(names.into_iter().map(|name| self.directory.join(name)).collect())
    }
}

/// Compare strings with runs of ASCII digits compared as numbers.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let a_end = digit_run_end(a, i);
            let b_end = digit_run_end(b, j);
            let a_num = trim_zeros(&a[i..a_end]);
            let b_num = trim_zeros(&b[j..b_end]);

            let ord = a_num.len().cmp(&b_num.len()).then_with(|| a_num.cmp(b_num));
            if ord != Ordering::Equal {
                return ord;
            }
            i = a_end;
            j = b_end;
            continue;
        }

        match a[i].cmp(&b[j]) {
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
            ord => return ord,
        }
    }

    (a.len() - i).cmp(&(b.len() - j))
}

fn digit_run_end(s: &[u8], start: usize) -> usize {
    s[start..]
        .iter()
        .position(|c| !c.is_ascii_digit())
        .map_or(s.len(), |n| start + n)
}

fn trim_zeros(digits: &[u8]) -> &[u8] {
    let zeros = digits.iter().take_while(|&&c| c == b'0').count();
    &digits[zeros.min(digits.len().saturating_sub(1))..]
}
