//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// secretref - Resolve secretref: references against secret backends
#[derive(Parser, Debug)]
#[command(name = "secretref")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to secretref.yaml config file
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve references and print their values
    Resolve(ResolveArgs),

    /// Validate reference syntax without contacting any backend
    Check(CheckArgs),

    /// List available secret providers
    Providers(ProvidersArgs),
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// References to resolve; values without the secretref: prefix are echoed unchanged
    #[arg(required = true, value_name = "REF")]
    pub refs: Vec<String>,

    /// Output as a JSON object keyed by reference
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// References to check
    #[arg(required = true, value_name = "REF")]
    pub refs: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ProvidersArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
