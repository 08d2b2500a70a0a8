//! `logfollow which`: show the glob(s) a pattern resolves to.

use crate::cli::WhichArgs;
use anyhow::Result;
use logfollow::config::Config;
use logfollow::finder::Finder;
use logfollow::pattern::Pattern;

pub fn run(args: &WhichArgs, config: &Config) -> Result<()> {
    for glob in globs(args, config)? {
        println!("{}", glob);
    }
    Ok(())
}

/// Globs to print. Without any match the pattern is shown relative to the
/// current directory, so the user sees what would have been searched.
fn globs(args: &WhichArgs, config: &Config) -> Result<Vec<String>> {
    let finder = Finder::new(config.search_dirs.iter().cloned());

    let found = if args.all {
        finder.find_all(&args.pattern)?
    } else {
        match finder.find(&args.pattern) {
            Ok(pattern) => vec![pattern],
            Err(e) => {
                tracing::debug!(error = %e, "no search directory matched");
                Vec::new()
            }
        }
    };

    if found.is_empty() {
        return Ok(vec![Pattern::new(&args.pattern)?.which()]);
    }
    Ok(found.iter().map(Pattern::which).collect())
}
