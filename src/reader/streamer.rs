//! Whole-line streaming of single files and rotated file sets into a
//! [`LineSink`].
//!
//! Every operation reports the byte offset it reached so a later read can
//! resume exactly where this one stopped.

use super::error::StreamError;
use super::scanner::{LineScanner, MAX_LINE_BYTES, NEWLINE, SEARCH_BUFFER_BYTES};
use super::LineSink;
use crate::cancel::CancelToken;
use flate2::read::MultiGzDecoder;
use memchr::memchr;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

/// Streams files line by line, forwards or backwards.
///
/// Holds the line length limit and the cancellation token observed between
/// lines. Each call opens its own handle and buffers.
#[derive(Debug, Clone)]
pub struct FileStreamer {
    max_line_len: usize,
    cancel: CancelToken,
}

impl Default for FileStreamer {
    fn default() -> Self {
        Self::new(CancelToken::new())
    }
}

impl FileStreamer {
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            max_line_len: MAX_LINE_BYTES,
            cancel,
        }
    }

    /// Override the maximum line length (excluding the `\n`).
    pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len.max(1);
        self
    }

    /// Same settings, different cancellation token.
    pub fn with_cancel(&self, cancel: CancelToken) -> Self {
        Self {
            max_line_len: self.max_line_len,
            cancel,
        }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn max_line_len(&self) -> usize {
        self.max_line_len
    }

    fn check_cancel(&self, position: u64) -> Result<(), StreamError> {
        match self.cancel.reason() {
            Some(reason) => Err(StreamError::cancelled(reason, position)),
            None => Ok(()),
        }
    }

    fn open(&self, path: &Path) -> Result<LineScanner<File>, StreamError> {
        let file = File::open(path).map_err(|e| StreamError::io(0, e))?;
        Ok(LineScanner::with_max_line_len(file, self.max_line_len))
    }

    /// Cat a whole file. See [`FileStreamer::cat_from`].
    pub fn cat(&self, path: &Path, sink: &mut dyn LineSink) -> Result<u64, StreamError> {
        self.cat_from(path, 0, sink)
    }

    /// Cat a file starting at byte `offset`.
    ///
    /// Returns the offset just past the last line handed to the sink. An
    /// offset beyond the end of the file (the file was truncated under us)
    /// restarts from the beginning.
    pub fn cat_from(
        &self,
        path: &Path,
        offset: u64,
        sink: &mut dyn LineSink,
    ) -> Result<u64, StreamError> {
        if is_gzip(path) {
            return self.cat_gzip(path, offset, sink);
        }

        let mut scanner = self.open(path)?;
        let end = scanner.peek_end_position()?;
        let start = if offset > end {
            tracing::warn!(
                path = %path.display(),
                offset,
                len = end,
                "file shrank below the resume offset, reading it from the start"
            );
            0
        } else {
            offset
        };
        scanner.seek_to(start)?;

        self.scan_forward(scanner.into_inner(), start, &display_name(path), sink)
    }

    /// Gzip files can only be read start to end. The returned cursor is the
    /// compressed length so a follower does not read them again.
    fn cat_gzip(
        &self,
        path: &Path,
        offset: u64,
        sink: &mut dyn LineSink,
    ) -> Result<u64, StreamError> {
        let file = File::open(path).map_err(|e| StreamError::io(0, e))?;
        let len = file.metadata().map_err(|e| StreamError::io(0, e))?.len();

        if offset > 0 {
            if offset >= len {
                return Ok(len);
            }
            return Err(StreamError::Unsupported {
                path: path.to_path_buf(),
                reason: "cannot resume a gzip file from a byte offset",
            });
        }

        tracing::debug!(path = %path.display(), "decompressing gzip file");
        let decoder = MultiGzDecoder::new(BufReader::new(file));
        self.scan_forward(decoder, 0, &display_name(path), sink)?;
        Ok(len)
    }

    /// Feed forward lines from `reader` (positioned at `start`) to the sink.
    fn scan_forward<R: Read>(
        &self,
        reader: R,
        start: u64,
        filename: &str,
        sink: &mut dyn LineSink,
    ) -> Result<u64, StreamError> {
        let mut reader = BufReader::with_capacity(SEARCH_BUFFER_BYTES, reader);
        let mut line = Vec::new();
        let mut pos = start;

        loop {
            self.check_cancel(pos)?;

            line.clear();
            let read = read_line(&mut reader, &mut line, self.max_line_len, pos)?;
            if read == 0 {
                return Ok(pos);
            }

            if line.ends_with(b"\r\n") {
                line.truncate(line.len() - 2);
                line.push(NEWLINE);
            }

            sink.handle_line(filename, &line)
                .map_err(|source| StreamError::Sink { source })?;
            pos += read as u64;
        }
    }

    /// Emit a file's lines last-line-first.
    ///
    /// Returns the final cursor, which is 0 once the whole file was read.
    pub fn tac(&self, path: &Path, sink: &mut dyn LineSink) -> Result<u64, StreamError> {
        reject_gzip(path, "cannot read a gzip file backwards")?;

        let filename = display_name(path);
        let mut scanner = self.open(path)?;
        let mut pos = scanner.seek_to_end()?;
        let mut scratch = Vec::new();

        while pos > 0 {
            self.check_cancel(pos)?;

            let (raw, line_start) = scanner.read_line_ending_here()?;
            let line = strip_cr(raw, &mut scratch);
            sink.handle_line(&filename, line)
                .map_err(|source| StreamError::Sink { source })?;

            pos = line_start;
        }

        Ok(pos)
    }

    /// Stream a file after moving `skip_lines` lines.
    ///
    /// Negative counts start that many lines before the end ("last N
    /// lines"); non-negative counts skip that many lines from the start.
    pub fn tail(
        &self,
        path: &Path,
        skip_lines: i64,
        sink: &mut dyn LineSink,
    ) -> Result<u64, StreamError> {
        reject_gzip(path, "cannot seek within a gzip file")?;

        let mut scanner = self.open(path)?;
        if skip_lines < 0 {
            scanner.seek_to_end()?;
        }
        let (_, pos) = scanner.move_lines(skip_lines)?;

        self.scan_forward(scanner.into_inner(), pos, &display_name(path), sink)
    }

    /// Tail a rotated file set given oldest to newest.
    ///
    /// First probes for the file where output should start (walking from
    /// the newest file for negative counts, from the oldest for
    /// non-negative ones), then streams that file from the found line and
    /// every newer file in full. Returns the cursor reached in the newest
    /// file.
    pub fn tail_files(
        &self,
        paths: &[PathBuf],
        num_lines: i64,
        sink: &mut dyn LineSink,
    ) -> Result<u64, StreamError> {
        if paths.is_empty() {
            return Err(StreamError::NoFiles);
        }

        let (start_index, start_line) = self.find_starting_file(paths, num_lines)?;
        tracing::debug!(
            path = %paths[start_index].display(),
            start_line,
            "starting multi-file tail"
        );

        let mut end = 0;
        for (i, path) in paths.iter().enumerate().skip(start_index) {
            let skip = if i == start_index { start_line } else { 0 };
            end = self.tail(path, skip, sink)?;
        }

        Ok(end)
    }

    /// Locate the file and intra-file line offset where a multi-file tail
    /// begins.
    fn find_starting_file(
        &self,
        paths: &[PathBuf],
        num_lines: i64,
    ) -> Result<(usize, i64), StreamError> {
        let mut remaining = num_lines;

        if num_lines < 0 {
            let mut start = (paths.len() - 1, num_lines);
            for (i, path) in paths.iter().enumerate().rev() {
                start = (i, remaining);
                remaining -= self.probe(path, remaining)?;
                if remaining >= 0 {
                    break;
                }
            }
            return Ok(start);
        }

        // If every file is exhausted this ends on the newest file with a
        // skip count past its end, so nothing is printed.
        let mut start = (0, num_lines);
        for (i, path) in paths.iter().enumerate() {
            start = (i, remaining);
            remaining -= self.probe(path, remaining)?;
            if remaining == 0 {
                break;
            }
        }
        Ok(start)
    }

    /// Dry run: how many lines `move_lines(n)` would traverse in `path`.
    fn probe(&self, path: &Path, n: i64) -> Result<i64, StreamError> {
        self.check_cancel(0)?;
        reject_gzip(path, "cannot seek within a gzip file")?;

        let mut scanner = self.open(path)?;
        if n < 0 {
            scanner.seek_to_end()?;
        }
        let (moved, _) = scanner.move_lines(n)?;

        tracing::trace!(path = %path.display(), requested = n, moved, "probed file");
        Ok(moved)
    }
}

/// Read one line (up to and including `\n`, or up to EOF) into `line`.
///
/// Returns the number of bytes consumed, 0 at EOF. Lines whose content
/// exceeds `limit` bytes fail with `LineTooLong` at `pos`, the line start.
fn read_line<R: BufRead>(
    reader: &mut R,
    line: &mut Vec<u8>,
    limit: usize,
    pos: u64,
) -> Result<usize, StreamError> {
    let mut read = 0usize;

    loop {
        let available = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(StreamError::io(pos + read as u64, e)),
        };
        if available.is_empty() {
            return Ok(read);
        }

        let (done, used) = match memchr(NEWLINE, available) {
            Some(i) => (true, i + 1),
            None => (false, available.len()),
        };
        line.extend_from_slice(&available[..used]);
        reader.consume(used);
        read += used;

        if line.len() - usize::from(done) > limit {
            return Err(StreamError::LineTooLong {
                position: pos,
                limit,
            });
        }
        if done {
            return Ok(read);
        }
    }
}

/// Turn a `\r\n` terminator into `\n`, copying only when needed.
fn strip_cr<'a>(raw: &'a [u8], scratch: &'a mut Vec<u8>) -> &'a [u8] {
    match raw.strip_suffix(b"\r\n") {
        Some(body) => {
            scratch.clear();
            scratch.extend_from_slice(body);
            scratch.push(NEWLINE);
            scratch
        }
        None => raw,
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

fn reject_gzip(path: &Path, reason: &'static str) -> Result<(), StreamError> {
    if is_gzip(path) {
        return Err(StreamError::Unsupported {
            path: path.to_path_buf(),
            reason,
        });
    }
    Ok(())
}

/// The name handed to sinks: the file's base name.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
