//! Live following of a rotated file set (`tail -f` across rotations).
//!
//! Two threads per follow: a discovery thread polls for files and queues
//! them, and the calling thread consumes the queue and streams each file
//! from the tail cursor. The queue is bounded and blocks the producer when
//! full, so no discovered path is dropped.

use super::error::StreamError;
use super::streamer::FileStreamer;
use super::{LineSink, TailCursor};
use crate::cancel::{CancelReason, CancelToken};
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread;
use std::time::Duration;

/// Pause between discovery polls; also bounds cancellation latency.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Capacity of the discovered-paths queue.
const QUEUE_CAPACITY: usize = 16;

/// Source of files to (re)read while following.
///
/// Each poll returns, in order, the file that was active at the previous
/// poll (if any) followed by files discovered since then. This ordering is
/// what guarantees an old file is drained before a newer one starts.
pub trait FileDiscovery {
    fn poll(&mut self) -> io::Result<Vec<PathBuf>>;
}

/// Follows new output across file rotations.
pub struct TailFollower<D> {
    discovery: D,
    streamer: FileStreamer,
    poll_interval: Duration,
}

impl<D: FileDiscovery + Send> TailFollower<D> {
    /// `streamer`'s cancellation token stops the whole follow.
    pub fn new(discovery: D, streamer: FileStreamer) -> Self {
        Self {
            discovery,
            streamer,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn discovery(&self) -> &D {
        &self.discovery
    }

    /// Keep streaming appended lines into `sink` until cancelled or an error
    /// occurs, starting from `cursor` and updating it as files are read.
    ///
    /// Always ends with an error: the cancellation (`Canceled` or
    /// `DeadlineExceeded`) in the normal case, otherwise the first real
    /// failure of either thread.
    pub fn follow(
        &mut self,
        cursor: &mut TailCursor,
        sink: &mut dyn LineSink,
    ) -> Result<(), StreamError> {
        let external = self.streamer.cancel_token().clone();
        // Cancelled by either side when it stops, so the other side stops too.
        let stop = external.child();
        let streamer = self.streamer.with_cancel(stop.clone());
        let interval = self.poll_interval;
        let discovery = &mut self.discovery;
        let (tx, rx) = mpsc::sync_channel(QUEUE_CAPACITY);

        tracing::debug!(
            path = %cursor.path.display(),
            offset = cursor.offset,
            "following"
        );

        let (watched, consumed) = thread::scope(|scope| {
            let watcher_stop = stop.clone();
            let handle = scope.spawn(move || {
                let result = watch_for_new_files(discovery, tx, &watcher_stop, interval);
                watcher_stop.cancel();
                result
            });

            let consumed = consume(&streamer, rx, cursor, sink, &stop, interval);
            stop.cancel();

            let watched = handle
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            (watched, consumed)
        });

        match (watched, consumed) {
            (Err(e), _) => Err(e),
            (Ok(()), Err(e)) if !e.is_cancellation() => Err(e),
            (Ok(()), consumed) => match external.reason() {
                Some(reason) => Err(StreamError::cancelled(reason, cursor.offset)),
                None => consumed,
            },
        }
    }
}

/// Discovery loop: poll, queue what was found, sleep, repeat.
///
/// Returns `Ok` when asked to stop or when the consumer went away.
fn watch_for_new_files<D: FileDiscovery>(
    discovery: &mut D,
    tx: SyncSender<PathBuf>,
    stop: &CancelToken,
    interval: Duration,
) -> Result<(), StreamError> {
    loop {
        if stop.is_cancelled() {
            return Ok(());
        }

        let paths = discovery
            .poll()
            .map_err(|source| StreamError::Discovery { source })?;

        for path in paths {
            if tx.send(path).is_err() {
                return Ok(());
            }
        }

        thread::sleep(interval);
    }
}

/// Consumer loop: stream each queued path from the cursor.
///
/// The same path as the cursor resumes at its offset; any other path is a
/// rotation and is read from the start.
fn consume(
    streamer: &FileStreamer,
    rx: Receiver<PathBuf>,
    cursor: &mut TailCursor,
    sink: &mut dyn LineSink,
    stop: &CancelToken,
    interval: Duration,
) -> Result<(), StreamError> {
    loop {
        if let Some(reason) = stop.reason() {
            return Err(StreamError::cancelled(reason, cursor.offset));
        }

        let path = match rx.recv_timeout(interval) {
            Ok(path) => path,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                let reason = stop.reason().unwrap_or(CancelReason::Canceled);
                return Err(StreamError::cancelled(reason, cursor.offset));
            }
        };

        if path != cursor.path {
            tracing::info!(
                from = %cursor.path.display(),
                to = %path.display(),
                "switching to rotated file"
            );
            *cursor = TailCursor::new(path, 0);
        }

        match streamer.cat_from(&cursor.path, cursor.offset, sink) {
            Ok(end) => cursor.offset = end,
            Err(e) => {
                if let (true, Some(position)) = (e.is_cancellation(), e.position()) {
                    cursor.offset = position;
                }
                return Err(e);
            }
        }
    }
}
