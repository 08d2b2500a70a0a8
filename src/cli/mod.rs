//! Command-line definitions for logfollow.

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "logfollow", version)]
#[command(about = "Read and follow rotated log files (<name>-out.log, <name>-error-3.log, ...)", long_about = None)]
pub struct Cli {
    /// Increase diagnostic output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for logfollow.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every matching file, oldest first
    Cat(CatArgs),

    /// Print every matching file last line first, newest file first
    Tac(CatArgs),

    /// Print the last lines of the rotated set, optionally following it
    Tail(TailArgs),

    /// Show the glob of files a pattern resolves to
    Which(WhichArgs),

    /// List the log sets in the search directories and the @tag values they contain
    Find(FindArgs),

    /// Config file commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Output flags shared by the printing commands.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Include blank lines in the output
    #[arg(long)]
    pub with_blanks: bool,

    /// Prefix each line with the name of the file it came from
    #[arg(long)]
    pub with_filename: bool,

    /// Pretty-print JSON lines
    #[arg(short = 'P', long)]
    pub pretty: bool,

    /// Color the filename prefix and pretty-printed JSON
    #[arg(short = 'C', long)]
    pub color: bool,
}

/// Arguments for the cat and tac subcommands.
#[derive(Args, Debug)]
pub struct CatArgs {
    /// File pattern, e.g. `api` or `/var/log/app/api.log`
    #[arg(value_name = "FILEPAT")]
    pub pattern: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for the tail subcommand.
#[derive(Args, Debug)]
pub struct TailArgs {
    /// File pattern, e.g. `api` or `/var/log/app/api.log`
    #[arg(value_name = "FILEPAT")]
    pub pattern: String,

    /// Start this many lines back (default 5, or `num_lines` from config)
    #[arg(short = 'n', long = "num-lines", value_name = "N")]
    pub num_lines: Option<u64>,

    /// Keep printing new lines, switching to new files as they appear
    #[arg(short, long)]
    pub follow: bool,

    /// Stop following after this many seconds
    #[arg(long, value_name = "SECS", requires = "follow")]
    pub timeout: Option<u64>,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for the which subcommand.
#[derive(Args, Debug)]
pub struct WhichArgs {
    /// File pattern, e.g. `api` or `/var/log/app/api.log`
    #[arg(value_name = "FILEPAT")]
    pub pattern: String,

    /// Show every search directory with matching files, not just the first
    #[arg(short, long)]
    pub all: bool,
}

/// Arguments for the find subcommand.
#[derive(Args, Debug)]
pub struct FindArgs {
    /// Only list tags in the log sets matching this file pattern
    #[arg(short = 'f', long = "filepat", value_name = "FILEPAT", conflicts_with = "tag")]
    pub file_pattern: Option<String>,

    /// List the log sets whose files contain this tag
    #[arg(short, long, value_name = "TAG")]
    pub tag: Option<String>,

    /// Read whole files instead of sampling their first lines
    #[arg(short, long)]
    pub all: bool,

    /// Lines to sample from each file without --all
    #[arg(short = 'n', long, value_name = "N", default_value_t = logfollow::tags::DEFAULT_SAMPLES)]
    pub samples: usize,
}

/// Config subcommand actions.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the config file
    Validate,
    /// Show effective configuration
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tail() {
        let cli = Cli::try_parse_from(["logfollow", "-vv", "tail", "-n", "10", "-f", "api", "--with-filename"])
            .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Tail(args) => {
                assert_eq!(args.pattern, "api");
                assert_eq!(args.num_lines, Some(10));
                assert!(args.follow);
                assert!(args.output.with_filename);
                assert!(!args.output.with_blanks);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_timeout_requires_follow() {
        assert!(Cli::try_parse_from(["logfollow", "tail", "--timeout", "5", "api"]).is_err());
        assert!(Cli::try_parse_from(["logfollow", "tail", "-f", "--timeout", "5", "api"]).is_ok());
    }

    #[test]
    fn test_parse_which_all() {
        let cli = Cli::try_parse_from(["logfollow", "which", "--all", "api"]).unwrap();
        assert!(matches!(cli.command, Commands::Which(WhichArgs { all: true, .. })));
    }

    #[test]
    fn test_parse_find() {
        let cli = Cli::try_parse_from(["logfollow", "find", "--filepat", "api", "-a"]).unwrap();
        match cli.command {
            Commands::Find(args) => {
                assert_eq!(args.file_pattern.as_deref(), Some("api"));
                assert_eq!(args.tag, None);
                assert!(args.all);
                assert_eq!(args.samples, logfollow::tags::DEFAULT_SAMPLES);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_find_filepat_conflicts_with_tag() {
        assert!(Cli::try_parse_from(["logfollow", "find", "-f", "api", "-t", "app"]).is_err());
        assert!(Cli::try_parse_from(["logfollow", "find", "-t", "app", "-n", "10"]).is_ok());
    }

    #[test]
    fn test_parse_config_show() {
        let cli = Cli::try_parse_from(["logfollow", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Show
            }
        ));
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
