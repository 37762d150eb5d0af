//! Lost & Found CLI - command-line interface for the item registry
//!
//! This CLI lets participants:
//! - Register an identity
//! - Report lost items (with an optional escrowed reward) and found items
//! - Resolve their own lost-item reports and claim found items
//! - Browse, search, and inspect items, users, and settlement receipts
//!
//! Every invocation replays the registry journal from the data directory,
//! runs one command, and exits.

use clap::Parser;
use lostfound_registry::RegistryFacade;
use lostfound_types::Identity;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;
mod output;

use commands::Commands;
use config::CliConfig;
use error::CliResult;

/// Lost & Found CLI application
#[derive(Parser)]
#[command(name = "lostfound")]
#[command(about = "Lost & Found - item registry and claim settlement", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "LOSTFOUND_CONFIG")]
    config: Option<String>,

    /// Directory holding the registry journal
    #[arg(short, long, env = "LOSTFOUND_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Identity to act as (e.g. an account address)
    #[arg(long = "as", env = "LOSTFOUND_IDENTITY")]
    identity: Option<String>,

    /// Output format (table, json, yaml)
    #[arg(short, long, value_enum, default_value = "table")]
    output: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = CliConfig::load(cli.config.as_deref())?;

    // Initialize tracing
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        config.log_filter.clone().unwrap_or_else(|| "warn".to_string())
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let caller = match cli.identity.or(config.identity.clone()) {
        Some(raw) => Some(Identity::parse(&raw)?),
        None => None,
    };

    let registry_config = config.registry_config(cli.data_dir)?;
    let registry = RegistryFacade::open(&registry_config)?;

    commands::execute(cli.command, &registry, caller.as_ref(), cli.output)
}
