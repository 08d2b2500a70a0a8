//! Signal handling for graceful shutdown.
//!
//! SIGINT/SIGTERM flip the flag behind a [`CancelToken`], so a running
//! `tail -f` stops at its next cancellation check and flushes output. A
//! second signal exits immediately with code 1.

use crate::cancel::CancelToken;
use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Register the termination handlers and return the token they cancel.
pub fn shutdown_token() -> Result<CancelToken, std::io::Error> {
    let term_now = Arc::new(AtomicBool::new(false));

    for sig in TERM_SIGNALS {
        // Only fires once term_now is already set, i.e. on the second signal
        flag::register_conditional_shutdown(*sig, 1, Arc::clone(&term_now))?;
        flag::register(*sig, Arc::clone(&term_now))?;
    }

    Ok(CancelToken::from_flag(term_now))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_token_starts_uncancelled() {
        let token = shutdown_token().unwrap();
        assert!(!token.is_cancelled());
    }
}
