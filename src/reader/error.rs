//! Error type shared by the scanner, streamer and follower.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::cancel::CancelReason;

/// Failure of a streaming operation.
///
/// Variants that happen while a file is open carry the best-known cursor at
/// the time of failure. Callers must not assume the cursor was rolled back.
#[derive(Debug)]
pub enum StreamError {
    /// Open, read or seek failure.
    Io { position: u64, source: io::Error },

    /// A line longer than the configured maximum. `position` is where the
    /// offending line starts.
    LineTooLong { position: u64, limit: usize },

    /// A multi-file tail was asked to work on an empty file list.
    NoFiles,

    /// Cancellation was requested.
    Canceled { position: u64 },

    /// The operation's deadline passed.
    DeadlineExceeded { position: u64 },

    /// The line sink failed to write a line.
    Sink { source: io::Error },

    /// The file discovery collaborator failed to poll.
    Discovery { source: io::Error },

    /// The operation cannot be performed on this file (e.g. seeking a gzip
    /// stream).
    Unsupported { path: PathBuf, reason: &'static str },
}

impl StreamError {
    pub(crate) fn io(position: u64, source: io::Error) -> Self {
        StreamError::Io { position, source }
    }

    pub(crate) fn cancelled(reason: CancelReason, position: u64) -> Self {
        match reason {
            CancelReason::Canceled => StreamError::Canceled { position },
            CancelReason::DeadlineExceeded => StreamError::DeadlineExceeded { position },
        }
    }

    /// Best-known cursor when the error happened, if a file was open.
    pub fn position(&self) -> Option<u64> {
        match self {
            StreamError::Io { position, .. }
            | StreamError::LineTooLong { position, .. }
            | StreamError::Canceled { position }
            | StreamError::DeadlineExceeded { position } => Some(*position),
            _ => None,
        }
    }

    /// True for the expected "asked to stop" termination paths.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            StreamError::Canceled { .. } | StreamError::DeadlineExceeded { .. }
        )
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Io { position, source } => {
                write!(f, "I/O error at byte {}: {}", position, source)
            }
            StreamError::LineTooLong { position, limit } => write!(
                f,
                "line starting at byte {} exceeds the maximum of {} bytes",
                position, limit
            ),
            StreamError::NoFiles => write!(f, "cannot tail an empty list of files"),
            StreamError::Canceled { position } => {
                write!(f, "operation canceled at byte {}", position)
            }
            StreamError::DeadlineExceeded { position } => {
                write!(f, "deadline exceeded at byte {}", position)
            }
            StreamError::Sink { source } => write!(f, "failed to write line: {}", source),
            StreamError::Discovery { source } => {
                write!(f, "failed to look for new files: {}", source)
            }
            StreamError::Unsupported { path, reason } => {
                write!(f, "{}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::Io { source, .. }
            | StreamError::Sink { source }
            | StreamError::Discovery { source } => Some(source),
            _ => None,
        }
    }
}
