mod commands;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "drg")]
#[command(version, about = "Data Reliability Guardrails CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a run's batch and enforce the downstream gate
    Validate(RunArgs),

    /// Re-validate a registered run, e.g. after its batch was repaired
    Replay(RunArgs),

    /// Show the downstream gate and open incidents
    Status {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Check a contract without validating data
    Check {
        /// Path to the contract file (YAML or TOML)
        contract: PathBuf,

        /// Output format: text, json
        #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },
}

/// Options shared by `validate` and `replay`.
#[derive(Args)]
pub(crate) struct RunArgs {
    /// Unique run identifier
    #[arg(long)]
    pub run_id: String,

    /// Path to the contract file (YAML or TOML)
    #[arg(short, long, default_value = "config/contract.yaml")]
    pub contract: PathBuf,

    /// Parquet batch to validate [default: data/raw/rides_<run_id>.parquet]
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Output format: text, json
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,
}

#[derive(Args)]
pub(crate) struct StoreArgs {
    /// Policy database file
    #[arg(long, env = "DRG_DATABASE", default_value = "drg.sqlite3")]
    pub db: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Commands::Validate(args) => commands::validate::execute(&args),
        Commands::Replay(args) => commands::replay::execute(&args),
        Commands::Status { store } => commands::status::execute(&store),
        Commands::Check { contract, format } => commands::check::execute(&contract, &format),
    }
}
