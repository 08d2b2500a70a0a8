// Library interface for logfollow
// Exposes the streaming engine and the file-set helpers used by the CLI

pub mod cancel;
pub mod config;
pub mod finder;
pub mod pattern;
pub mod printer;
pub mod reader;
pub mod signal;
pub mod tags;
pub mod watcher;

#[cfg(test)]
mod test_utils;

pub use cancel::{CancelReason, CancelToken};
