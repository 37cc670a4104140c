//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod credentials;
mod job;
mod poll;
mod wait;

pub use credentials::CredentialsCommands;
pub use job::CreateCommands;
pub use poll::PollArgs;
pub use wait::WaitArgs;

use anyhow::Result;
use clap::Subcommand;
use evaboot_core::domain::resource::Resource;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start new jobs
    Create {
        #[command(subcommand)]
        command: CreateCommands,
    },
    /// Fetch jobs by ID
    Get {
        /// Resource the jobs belong to
        resource: Resource,

        /// Job IDs
        #[arg(required = true)]
        job_ids: Vec<String>,
    },
    /// List the jobs of a resource
    List {
        /// Resource whose jobs are listed
        resource: Resource,
    },
    /// Wait for jobs to finish
    Wait(WaitArgs),
    /// Emit jobs that finished since the last poll
    Poll(PollArgs),
    /// Credential management
    Credentials {
        #[command(subcommand)]
        command: CredentialsCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Create { command } => job::create_jobs(command, config).await,
        Commands::Get { resource, job_ids } => job::get_jobs(resource, job_ids, config).await,
        Commands::List { resource } => job::list_jobs(resource, config).await,
        Commands::Wait(args) => wait::wait_for_jobs(args, config).await,
        Commands::Poll(args) => poll::poll_jobs(args, config).await,
        Commands::Credentials { command } => {
            credentials::handle_credentials_command(command, config).await
        }
    }
}
