//! `logfollow tail`: last lines of the rotated set, then optionally follow.

use super::{print_options, resolve, streamer, SkipCompressed};
use crate::cli::TailArgs;
use anyhow::{Context, Result};
use logfollow::config::Config;
use logfollow::printer::LinePrinter;
use logfollow::reader::{FileDiscovery, TailCursor, TailFollower};
use logfollow::watcher::Watcher;
use logfollow::CancelToken;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Hides compressed rotations from the follower.
struct Uncompressed {
    watcher: Watcher,
    skip: SkipCompressed,
}

impl FileDiscovery for Uncompressed {
    fn poll(&mut self) -> io::Result<Vec<PathBuf>> {
        let mut paths = self.watcher.poll()?;
        paths.retain(|path| self.skip.keep(path));
        Ok(paths)
    }
}

pub fn run(args: &TailArgs, config: &Config, cancel: CancelToken) -> Result<()> {
    let pattern = resolve(config, &args.pattern)?;
    let glob = pattern.which();
    let num_lines = args.num_lines.unwrap_or(config.num_lines);

    let mut watcher = Watcher::new(pattern);
    watcher
        .scan()
        .with_context(|| format!("Failed to list {}", glob))?;
    let mut skip = SkipCompressed::default();
    let files: Vec<PathBuf> = watcher
        .new_files()
        .iter()
        .filter(|path| skip.keep(path))
        .cloned()
        .collect();

    let cancel = match args.timeout {
        Some(secs) => cancel.child_with_timeout(Duration::from_secs(secs)),
        None => cancel,
    };
    let streamer = streamer(config, cancel);
    let mut printer = LinePrinter::new(io::stdout().lock(), print_options(config, &args.output));

    let mut cursor = match files.last() {
        None if args.follow => TailCursor::default(),
        None => anyhow::bail!("no files match {}", glob),
        Some(newest) if num_lines == 0 => {
            let len = std::fs::metadata(newest)
                .with_context(|| format!("Failed to read {}", newest.display()))?
                .len();
            TailCursor::new(newest, len)
        }
        Some(newest) => {
            let count = i64::try_from(num_lines).unwrap_or(i64::MAX);
            let end = streamer
                .tail_files(&files, -count, &mut printer)
                .with_context(|| format!("Failed to tail {}", glob))?;
            TailCursor::new(newest, end)
        }
    };
    printer.flush()?;

    if !args.follow {
        return Ok(());
    }

    tracing::info!(glob = %glob, "following");
    let discovery = Uncompressed { watcher, skip };
    let mut follower =
        TailFollower::new(discovery, streamer).with_poll_interval(config.poll_interval);
    let result = follower.follow(&mut cursor, &mut printer);
    printer.flush()?;

    match result {
        Err(e) if e.is_cancellation() => {
            tracing::debug!(
                path = %cursor.path.display(),
                offset = cursor.offset,
                "stopped following"
            );
            Ok(())
        }
        other => other.with_context(|| format!("Failed to follow {}", glob)),
    }
}
