//! Collect the `@tag` values that appear in JSON log lines.

use crate::pattern::{Pattern, SortOrder};
use flate2::read::MultiGzDecoder;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Lines read from each file when sampling.
pub const DEFAULT_SAMPLES: usize = 1000;

#[derive(Deserialize)]
struct Tagged {
    #[serde(rename = "@tag")]
    tag: Option<serde_json::Value>,
}

/// Accumulates distinct `@tag` values across files.
#[derive(Debug, Clone, Default)]
pub struct TagFinder {
    tags: BTreeSet<String>,
    /// Lines to read per file; `None` reads whole files
    samples: Option<usize>,
}

impl TagFinder {
    pub fn new(samples: Option<usize>) -> Self {
        Self {
            tags: BTreeSet::new(),
            samples,
        }
    }

    /// Read every file of `pattern`, oldest first.
    ///
    /// Files that cannot be opened or read are logged and skipped; only a
    /// failure to list the directory is returned.
    pub fn scan_pattern(&mut self, pattern: &Pattern) -> io::Result<()> {
        for path in pattern.files(SortOrder::OldestFirst)? {
            if let Err(e) = self.scan_file(&path) {
                tracing::warn!(path = %path.display(), error = %e, "failed to read tags");
            }
        }
        Ok(())
    }

    /// Read one file; `.gz` files are decompressed.
    pub fn scan_file(&mut self, path: &Path) -> io::Result<()> {
        let file = File::open(path)?;
        if path.extension().is_some_and(|ext| ext == "gz") {
            self.scan(BufReader::new(MultiGzDecoder::new(BufReader::new(file))))
        } else {
            self.scan(BufReader::new(file))
        }
    }

    pub fn scan<R: BufRead>(&mut self, mut reader: R) -> io::Result<()> {
        let mut line = Vec::new();
        let mut count = 0usize;

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                return Ok(());
            }
            count += 1;

            if let Some(tag) = extract_tag(&line) {
                self.tags.insert(tag);
            }

            if self.samples.is_some_and(|samples| count >= samples) {
                return Ok(());
            }
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Tags seen so far, sorted.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

/// The string `@tag` of a JSON object line, if any.
fn extract_tag(line: &[u8]) -> Option<String> {
    let first = line.iter().find(|b| !b.is_ascii_whitespace())?;
    if *first != b'{' {
        return None;
    }
    match serde_json::from_slice::<Tagged>(line).ok()?.tag? {
        serde_json::Value::String(tag) => Some(tag),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::write_file;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};
    use tempfile::TempDir;

    fn tags_of(finder: &TagFinder) -> Vec<&str> {
        finder.tags().collect()
    }

    #[test]
    fn test_extract_tag() {
        assert_eq!(extract_tag(br#"{"@tag":"app.api","msg":"x"}"#).as_deref(), Some("app.api"));
        assert_eq!(extract_tag(br#"  {"@tag":"esc\"aped"}"#).as_deref(), Some("esc\"aped"));
        assert_eq!(extract_tag(br#"{"@tag":42}"#), None);
        assert_eq!(extract_tag(br#"{"@tag":{"nested":true}}"#), None);
        assert_eq!(extract_tag(br#"{"msg":"no tag"}"#), None);
        assert_eq!(extract_tag(b"plain text"), None);
        assert_eq!(extract_tag(br#"["@tag"]"#), None);
    }

    #[test]
    fn test_scan_collects_sorted_distinct_tags() {
        let data = concat!(
            "{\"@tag\":\"b\"}\n",
            "not json\n",
            "{\"@tag\":\"a\"}\n",
            "{\"@tag\":\"b\"}\n",
        );
        let mut finder = TagFinder::new(None);
        finder.scan(Cursor::new(data)).unwrap();

        assert_eq!(tags_of(&finder), vec!["a", "b"]);
        assert!(finder.contains("a"));
        assert!(!finder.contains("c"));
    }

    #[test]
    fn test_scan_stops_after_samples() {
        let data = "{\"@tag\":\"first\"}\nskip\n{\"@tag\":\"late\"}\n";

        let mut sampled = TagFinder::new(Some(2));
        sampled.scan(Cursor::new(data)).unwrap();
        let mut full = TagFinder::new(None);
        full.scan(Cursor::new(data)).unwrap();

        assert_eq!(tags_of(&sampled), vec!["first"]);
        assert_eq!(tags_of(&full), vec!["first", "late"]);
    }

    #[test]
    fn test_scan_pattern_reads_every_file() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "api-out-1.log", b"{\"@tag\":\"old\"}\n");
        write_file(dir.path(), "api-out.log", b"{\"@tag\":\"new\"}\n");
        write_file(dir.path(), "web-out.log", b"{\"@tag\":\"other\"}\n");

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"{\"@tag\":\"zipped\"}\n").unwrap();
        write_file(dir.path(), "api-error-2.log.gz", &encoder.finish().unwrap());

        let pattern = Pattern::new(&dir.path().join("api").to_string_lossy()).unwrap();
        let mut finder = TagFinder::new(Some(DEFAULT_SAMPLES));
        finder.scan_pattern(&pattern).unwrap();

        assert_eq!(tags_of(&finder), vec!["new", "old", "zipped"]);
    }
}
