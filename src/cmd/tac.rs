//! `logfollow tac`: newest file first, each file last line first.

use super::{print_options, resolve, streamer, SkipCompressed};
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
        .files(SortOrder::NewestFirst)
        .with_context(|| format!("Failed to list {}", pattern.which()))?;

    let streamer = streamer(config, cancel);
    let mut printer = LinePrinter::new(io::stdout().lock(), print_options(config, &args.output));

    let mut skip = SkipCompressed::default();
    for path in files.iter().filter(|path| skip.keep(path)) {
        tracing::debug!(path = %path.display(), "tac");
        streamer
            .tac(path, &mut printer)
            .with_context(|| format!("Failed to read {}", path.display()))?;
    }

    printer.flush()?;
    Ok(())
}
