//! `logfollow find`: list log sets and the `@tag` values found in them.

use crate::cli::FindArgs;
use anyhow::{Context, Result};
use logfollow::config::Config;
use logfollow::finder::Finder;
use logfollow::pattern::Pattern;
use logfollow::tags::TagFinder;
use std::io::{self, Write};

pub fn run(args: &FindArgs, config: &Config) -> Result<()> {
    let finder = Finder::new(config.search_dirs.iter().cloned());
    let mut out = io::stdout().lock();

    match (&args.file_pattern, &args.tag) {
        (Some(pattern), _) => {
            let sets = finder.find_all(pattern)?;
            print_tags(&mut out, &sets, args)?;
        }
        (None, Some(tag)) => {
            let sets = finder.discover()?;
            print_sets_with_tag(&mut out, &sets, tag, args)?;
        }
        (None, None) => {
            let sets = finder.discover()?;
            print_tags(&mut out, &sets, args)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn samples(args: &FindArgs) -> Option<usize> {
    (!args.all).then_some(args.samples)
}

/// Tags of one log set; `None` when its directory could not be listed.
fn tags_of(pattern: &Pattern, args: &FindArgs) -> Option<TagFinder> {
    let mut tags = TagFinder::new(samples(args));
    match tags.scan_pattern(pattern) {
        Ok(()) => Some(tags),
        Err(e) => {
            eprintln!("Error: failed to read {}: {}", pattern.which(), e);
            None
        }
    }
}

fn print_tags<W: Write>(out: &mut W, sets: &[Pattern], args: &FindArgs) -> Result<()> {
    for pattern in sets {
        let Some(tags) = tags_of(pattern, args) else {
            continue;
        };
        writeln!(out, "@tag values in {}:", pattern.which()).context("Failed to write output")?;
        for tag in tags.tags() {
            writeln!(out, "  {}", tag)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn print_sets_with_tag<W: Write>(
    out: &mut W,
    sets: &[Pattern],
    tag: &str,
    args: &FindArgs,
) -> Result<()> {
    for pattern in sets {
        if tags_of(pattern, args).is_some_and(|tags| tags.contains(tag)) {
            writeln!(out, "{}", pattern.original()).context("Failed to write output")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use logfollow::tags::DEFAULT_SAMPLES;
    use std::fs;
    use tempfile::TempDir;

    fn args(all: bool, samples: usize) -> FindArgs {
        FindArgs {
            file_pattern: None,
            tag: None,
            all,
            samples,
        }
    }

    fn log_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("api-out.log"),
            "{\"@tag\":\"app.api\"}\nplain\n{\"@tag\":\"app.auth\"}\n",
        )
        .unwrap();
        fs::write(dir.path().join("web-error-1.log"), "{\"@tag\":\"app.web\"}\n").unwrap();
        dir
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_print_tags_for_every_set() {
        let dir = log_dir();
        let sets = Finder::new([dir.path()]).discover().unwrap();

        let out = render(|out| print_tags(out, &sets, &args(false, DEFAULT_SAMPLES)));

        let expected = format!(
            "@tag values in {}:\n  app.api\n  app.auth\n\n@tag values in {}:\n  app.web\n\n",
            dir.path().join("api-*.log").display(),
            dir.path().join("web-*.log").display(),
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_print_tags_sampled() {
        let dir = log_dir();
        let sets = Finder::new([dir.path()]).find_all("api").unwrap();

        let out = render(|out| print_tags(out, &sets, &args(false, 1)));
        assert!(out.contains("  app.api\n"));
        assert!(!out.contains("app.auth"));

        let out = render(|out| print_tags(out, &sets, &args(true, 1)));
        assert!(out.contains("  app.auth\n"));
    }

    #[test]
    fn test_print_sets_with_tag() {
        let dir = log_dir();
        let sets = Finder::new([dir.path()]).discover().unwrap();

        let out = render(|out| print_sets_with_tag(out, &sets, "app.web", &args(true, 0)));
        assert_eq!(out, format!("{}\n", dir.path().join("web.log").display()));

        let out = render(|out| print_sets_with_tag(out, &sets, "missing", &args(true, 0)));
        assert!(out.is_empty());
    }
}
