//! Evaboot CLI
//!
//! Command-line interface for the Evaboot lead enrichment API: start jobs,
//! wait for them, and poll for the ones that finished.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "evaboot")]
#[command(about = "Evaboot lead enrichment CLI", long_about = None)]
struct Cli {
    /// Evaboot API token
    #[arg(long, env = "EVABOOT_API_TOKEN", hide_env_values = true)]
    api_token: String,

    /// Evaboot API URL
    #[arg(long, env = "EVABOOT_BASE_URL", default_value = evaboot_client::DEFAULT_BASE_URL)]
    base_url: String,

    /// Turn failed items into error records instead of aborting
    #[arg(long, global = true)]
    continue_on_fail: bool,

    /// Log requests and polling progress
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "evaboot_client=debug,evaboot_runner=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config {
        api_token: cli.api_token,
        base_url: cli.base_url,
        continue_on_fail: cli.continue_on_fail,
    };

    handle_command(cli.command, &config).await
}
