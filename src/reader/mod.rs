//! Line streaming engine: directional scanning, cat/tac/tail over single
//! files and rotated file sets, and live following across rotations.

pub mod error;
pub mod follower;
pub mod scanner;
pub mod streamer;

pub use error::StreamError;
pub use follower::{FileDiscovery, TailFollower, DEFAULT_POLL_INTERVAL};
pub use scanner::{LineScanner, MAX_LINE_BYTES};
pub use streamer::FileStreamer;

use std::io;
use std::path::PathBuf;

/// Consumer of streamed lines.
///
/// `line` carries its trailing `\n` when the line had one (a `\r` before it
/// has already been removed). Returns whether the line was consumed (e.g.
/// printed rather than filtered out). Write failures are returned as errors
/// and abort the streaming operation.
pub trait LineSink {
    fn handle_line(&mut self, filename: &str, line: &[u8]) -> io::Result<bool>;
}

impl<S: LineSink + ?Sized> LineSink for &mut S {
    fn handle_line(&mut self, filename: &str, line: &[u8]) -> io::Result<bool> {
        (**self).handle_line(filename, line)
    }
}

/// Where live-following resumes: a file and a byte offset inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TailCursor {
    /// Empty until a file has been read
    pub path: PathBuf,
    pub offset: u64,
}

impl TailCursor {
    pub fn new(path: impl Into<PathBuf>, offset: u64) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }
}
