use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Why a [`CancelToken`] reports itself as cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Someone called `cancel()` (or a signal handler flipped the flag)
    Canceled,
    /// The token's deadline passed
    DeadlineExceeded,
}

/// A token for cooperative cancellation of long-running operations
///
/// Cloning a CancelToken creates a new handle to the same underlying
/// cancellation state. When any handle calls `cancel()`, all handles
/// will observe `is_cancelled() == true`.
///
/// A token may also carry a deadline, and child tokens observe their
/// parent's state while being cancellable on their own.
#[derive(Clone, Debug)]
pub struct CancelToken {
    /// Shared cancellation flag
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
    parent: Option<Box<CancelToken>>,
}

impl CancelToken {
    /// Create a new cancellation token
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: None,
            parent: None,
        }
    }

    /// Create a token that reports [`CancelReason::DeadlineExceeded`] once
    /// `timeout` has elapsed.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            ..Self::new()
        }
    }

    /// Wrap an existing flag, e.g. one registered with a signal handler.
    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self {
            cancelled: flag,
            deadline: None,
            parent: None,
        }
    }

    /// Create a child token.
    ///
    /// The child is cancelled whenever this token is, but cancelling the
    /// child leaves this token untouched.
    pub fn child(&self) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: None,
            parent: Some(Box::new(self.clone())),
        }
    }

    /// Create a child token that also expires after `timeout`.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            ..self.child()
        }
    }

    /// Request cancellation
    ///
    /// This is a non-blocking operation. The operation being cancelled
    /// must cooperatively check `is_cancelled()` and stop when true.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// The reason this token is cancelled, if it is.
    ///
    /// An explicit cancel wins over an expired deadline.
    pub fn reason(&self) -> Option<CancelReason> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Some(CancelReason::Canceled);
        }
        if let Some(reason) = self.parent.as_ref().and_then(|p| p.reason()) {
            return Some(reason);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
