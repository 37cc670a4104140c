//! Credentials command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;

use crate::config::Config;

/// Credentials subcommands
#[derive(Subcommand)]
pub enum CredentialsCommands {
    /// Check that the API token is accepted
    Test,
}

pub async fn handle_credentials_command(
    command: CredentialsCommands,
    config: &Config,
) -> Result<()> {
    match command {
        CredentialsCommands::Test => test_credentials(config).await,
    }
}

async fn test_credentials(config: &Config) -> Result<()> {
    let client = config.client()?;

    match client.verify_credentials().await {
        Ok(()) => {
            eprintln!(
                "{} Credentials accepted by {}",
                "✓".green(),
                client.base_url().cyan()
            );
            Ok(())
        }
        Err(e) if e.is_unauthorized() => {
            eprintln!("{} {}", "✗".red(), "API token rejected".red());
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}
