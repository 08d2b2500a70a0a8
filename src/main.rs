mod cli;
mod cmd;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, ConfigAction};
use logfollow::reader::StreamError;
use logfollow::{config, signal};
use std::io;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match cli.command {
        Commands::Config { action } => {
            let result = match action {
                ConfigAction::Validate => cmd::config::validate(),
                ConfigAction::Show => cmd::config::show(),
            };
            result.err().unwrap_or(0)
        }
        command => match run(command) {
            Ok(()) => 0,
            Err(e) => exit_code(&e),
        },
    };

    std::process::exit(code);
}

fn run(command: Commands) -> Result<()> {
    let (discovery, searched) = config::discover_verbose();
    tracing::debug!(?searched, ?discovery, "config discovery");
    let config = config::load(&discovery)?;

    let cancel = signal::shutdown_token().context("Failed to install signal handlers")?;

    match command {
        Commands::Cat(args) => cmd::cat::run(&args, &config, cancel),
        Commands::Tac(args) => cmd::tac::run(&args, &config, cancel),
        Commands::Tail(args) => cmd::tail::run(&args, &config, cancel),
        Commands::Which(args) => cmd::which::run(&args, &config),
        Commands::Find(args) => cmd::find::run(&args, &config),
        Commands::Config { .. } => Ok(()),
    }
}

/// Interrupted runs and closed pipes are normal ways for a pager pipeline
/// to end, so they exit without an error message.
fn exit_code(err: &anyhow::Error) -> i32 {
    let cancelled = err
        .chain()
        .filter_map(|e| e.downcast_ref::<StreamError>())
        .any(StreamError::is_cancellation);
    if cancelled {
        return 130;
    }

    let broken_pipe = err
        .chain()
        .filter_map(|e| e.downcast_ref::<io::Error>())
        .any(|e| e.kind() == io::ErrorKind::BrokenPipe);
    if broken_pipe {
        return 0;
    }

    match err.downcast_ref::<config::ConfigError>() {
        Some(config_error) => eprint!("{}", config_error),
        None => eprintln!("Error: {:#}", err),
    }
    1
}
