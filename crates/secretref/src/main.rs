//! secretref CLI - Resolve secretref: references from the command line
//!
//! This is the main entry point for the secretref command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Resolve(args) => commands::resolve::run(args, cli.config.as_deref()).await,
        Commands::Check(args) => commands::check::run(args),
        Commands::Providers(args) => commands::providers::run(args, cli.config.as_deref()),
    }
}

/// Initialize tracing with appropriate verbosity
///
/// Logs go to stderr so resolved values on stdout stay pipeable.
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
