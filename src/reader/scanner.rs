//! Byte-level line navigation over a seekable handle.
//!
//! Every primitive assumes the cursor sits at a line start (position 0 or
//! just after a `\n`) and leaves it at a line start. Scratch buffers are
//! owned by the scanner, so scanners on different threads never share them.

use super::error::StreamError;
use memchr::{memchr, memrchr};
use std::cmp::Ordering;
use std::io::{ErrorKind, Read, Seek, SeekFrom};

pub const NEWLINE: u8 = b'\n';

/// Longest line (excluding its terminator) the engine accepts.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Chunk size used when searching for newlines in either direction.
pub const SEARCH_BUFFER_BYTES: usize = 64 * 1024;

/// First chunk of a backward search.
const MIN_SEARCH_CHUNK: usize = 256;

/// Directional line scanner over any `Read + Seek` handle.
pub struct LineScanner<R> {
    inner: R,
    /// Chunk buffer for stepping over lines
    search_buf: Vec<u8>,
    /// Line buffer for `read_line_ending_here`, never longer than
    /// `max_line_len + 1`
    line_buf: Vec<u8>,
    max_line_len: usize,
}

impl<R: Read + Seek> LineScanner<R> {
    pub fn new(inner: R) -> Self {
        Self::with_max_line_len(inner, MAX_LINE_BYTES)
    }

    pub fn with_max_line_len(inner: R, max_line_len: usize) -> Self {
        Self {
            inner,
            search_buf: vec![0; SEARCH_BUFFER_BYTES],
            line_buf: Vec::new(),
            max_line_len: max_line_len.max(1),
        }
    }

    pub fn max_line_len(&self) -> usize {
        self.max_line_len
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Current cursor.
    pub fn position(&mut self) -> Result<u64, StreamError> {
        self.inner
            .stream_position()
            .map_err(|e| StreamError::io(0, e))
    }

    /// Move the cursor to an absolute offset.
    pub fn seek_to(&mut self, pos: u64) -> Result<u64, StreamError> {
        self.inner
            .seek(SeekFrom::Start(pos))
            .map_err(|e| StreamError::io(pos, e))
    }

    /// Move the cursor to end-of-file and return it.
    pub fn seek_to_end(&mut self) -> Result<u64, StreamError> {
        let pos = self.position()?;
        self.inner
            .seek(SeekFrom::End(0))
            .map_err(|e| StreamError::io(pos, e))
    }

    /// File length, leaving the cursor where it was.
    ///
    /// The cursor is restored even when finding the end fails.
    pub fn peek_end_position(&mut self) -> Result<u64, StreamError> {
        let pos = self.position()?;
        let end = self.inner.seek(SeekFrom::End(0));
        let restored = self.inner.seek(SeekFrom::Start(pos));

        match (end, restored) {
            (Ok(end), Ok(_)) => Ok(end),
            (Err(e), _) | (_, Err(e)) => Err(StreamError::io(pos, e)),
        }
    }

    /// Advance past the next `\n` (or to end-of-file if there is none).
    ///
    /// At end-of-file this is a no-op.
    pub fn step_forward(&mut self) -> Result<u64, StreamError> {
        let mut pos = self.position()?;

        loop {
            let n = match self.inner.read(&mut self.search_buf) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(StreamError::io(pos, e)),
            };

            if n == 0 {
                return Ok(pos);
            }

            if let Some(i) = memchr(NEWLINE, &self.search_buf[..n]) {
                return self.seek_to(pos + i as u64 + 1);
            }

            pos += n as u64;
        }
    }

    /// Move to the start of the previous line.
    ///
    /// Steps back over the byte just before the cursor (normally the
    /// previous line's `\n`) and then scans backwards for the next `\n`,
    /// landing just after it, or at 0. At position 0 this is a no-op.
    pub fn step_backward(&mut self) -> Result<u64, StreamError> {
        let start = self.position()?;
        if start == 0 {
            return Ok(0);
        }

        let line_start = self.find_line_start(start - 1, u64::MAX)?.unwrap_or(0);
        self.seek_to(line_start)
    }

    /// Read the line that ends at the cursor and move to its start.
    ///
    /// The returned bytes include the line's own `\n` when it has one; `\r`
    /// is left in place. At position 0 an empty slice is returned.
    ///
    /// Lines longer than `max_line_len` fail with `LineTooLong`; the cursor
    /// is left at the end of that line and `position` reports it.
    pub fn read_line_ending_here(&mut self) -> Result<(&[u8], u64), StreamError> {
        let pos = self.position()?;
        if pos == 0 {
            return Ok((&[], 0));
        }

        let mut last = [0u8; 1];
        self.seek_to(pos - 1)?;
        self.inner
            .read_exact(&mut last)
            .map_err(|e| StreamError::io(pos, e))?;
        let body_end = if last[0] == NEWLINE { pos - 1 } else { pos };

        let limit = self.max_line_len as u64;
        let line_start = match self.find_line_start(body_end, limit)? {
            Some(start) if body_end - start <= limit => start,
            _ => {
                self.seek_to(pos)?;
                return Err(StreamError::LineTooLong {
                    position: pos,
                    limit: self.max_line_len,
                });
            }
        };

        let len = (pos - line_start) as usize;
        self.seek_to(line_start)?;
        self.line_buf.resize(len, 0);
        self.inner
            .read_exact(&mut self.line_buf[..len])
            .map_err(|e| StreamError::io(pos, e))?;
        self.seek_to(line_start)?;

        Ok((&self.line_buf[..len], line_start))
    }

    /// Offset just after the last `\n` before `end`, or 0 if there is none.
    ///
    /// Chunks start small and double up to `SEARCH_BUFFER_BYTES`, so short
    /// lines cost about their own length. Returns `None` once more than
    /// `limit` bytes were scanned without finding a `\n`.
    fn find_line_start(&mut self, end: u64, limit: u64) -> Result<Option<u64>, StreamError> {
        let mut scan = end;
        let mut chunk_len = MIN_SEARCH_CHUNK;

        while scan > 0 {
            if end - scan > limit {
                return Ok(None);
            }

            let chunk = scan.min(chunk_len as u64) as usize;
            let chunk_start = scan - chunk as u64;

            self.seek_to(chunk_start)?;
            self.inner
                .read_exact(&mut self.search_buf[..chunk])
                .map_err(|e| StreamError::io(chunk_start, e))?;

            if let Some(i) = memrchr(NEWLINE, &self.search_buf[..chunk]) {
                return Ok(Some(chunk_start + i as u64 + 1));
            }

            scan = chunk_start;
            chunk_len = (chunk_len * 2).min(SEARCH_BUFFER_BYTES);
        }

        Ok(Some(0))
    }

    /// Move `n` lines forward (`n > 0`) or backward (`n < 0`).
    ///
    /// Stops early at a file boundary. Returns the signed number of lines
    /// actually moved and the final cursor.
    pub fn move_lines(&mut self, n: i64) -> Result<(i64, u64), StreamError> {
        let mut moved = 0i64;
        let mut pos = self.position()?;

        match n.cmp(&0) {
            Ordering::Equal => {}
            Ordering::Less => {
                while moved > n && pos > 0 {
                    pos = self.step_backward()?;
                    moved -= 1;
                }
            }
            Ordering::Greater => {
                let end = self.peek_end_position()?;
                while moved < n && pos < end {
                    pos = self.step_forward()?;
                    moved += 1;
                }
            }
        }

        Ok((moved, pos))
    }
}
