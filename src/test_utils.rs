use crate::reader::LineSink;
use std::io;
use std::path::{Path, PathBuf};

/// Sink that keeps every line in memory, tagged with its file name.
#[derive(Default)]
pub struct CollectingSink {
    pub lines: Vec<(String, Vec<u8>)>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines as lossy UTF-8, terminators included.
    pub fn texts(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|(_, line)| String::from_utf8_lossy(line).into_owned())
            .collect()
    }

    /// Everything received, concatenated.
    pub fn bytes(&self) -> Vec<u8> {
        self.lines.iter().flat_map(|(_, line)| line.clone()).collect()
    }
}

impl LineSink for CollectingSink {
    fn handle_line(&mut self, filename: &str, line: &[u8]) -> io::Result<bool> {
        self.lines.push((filename.to_string(), line.to_vec()));
        Ok(true)
    }
}

/// Write `content` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
