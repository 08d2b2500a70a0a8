//! `logfollow cat`: every matching file, oldest first.

use super::{print_options, resolve, streamer};
use crate::cli::CatArgs;
use anyhow::{Context, Result};
use logfollow::config::Config;
use logfollow::pattern::SortOrder;
use logfollow::printer::LinePrinter;
use logfollow::CancelToken;
use std::io;

pub fn run(args: &CatArgs, config: &Config, cancel: CancelToken) -> Result<()> {
    let pattern = resolve(config, &args.pattern)?;
    let files = pattern
        .files(SortOrder::OldestFirst)
        .with_context(|| format!("Failed to list {}", pattern.which()))?;

    let streamer = streamer(config, cancel);
    let mut printer = LinePrinter::new(io::stdout().lock(), print_options(config, &args.output));

    for path in &files {
        tracing::debug!(path = %path.display(), "cat");
        streamer
            .cat(path, &mut printer)
            .with_context(|| format!("Failed to read {}", path.display()))?;
    }

    printer.flush()?;
    Ok(())
}
