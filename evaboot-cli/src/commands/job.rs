//! Job command handlers
//!
//! Create, get and list jobs of every resource. Commands taking several
//! inputs run them as one batch, honouring `--continue-on-fail`.

use anyhow::Result;
use colored::*;
use evaboot_client::Operation;
use evaboot_core::domain::resource::Resource;
use evaboot_core::dto::job::{CreateJobRequest, ExtractLinkedin, FindEmail, ValidateEmail};
use evaboot_runner::batch::run_batch;

use crate::config::Config;
use crate::output;

/// Create subcommands, one per resource
#[derive(clap::Subcommand)]
pub enum CreateCommands {
    /// Find the professional email of a person
    EmailFinder {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        company_name: String,

        /// Company domain, improves accuracy when known
        #[arg(long)]
        company_domain: Option<String>,
    },
    /// Validate email addresses, one job per address
    EmailValidation {
        #[arg(required = true)]
        emails: Vec<String>,
    },
    /// Extract leads from LinkedIn Sales Navigator searches, one job per URL
    LinkedinExtraction {
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

impl CreateCommands {
    fn into_requests(self) -> Vec<CreateJobRequest> {
        match self {
            CreateCommands::EmailFinder {
                first_name,
                last_name,
                company_name,
                company_domain,
            } => vec![CreateJobRequest::EmailFinder(FindEmail::new(
                first_name,
                last_name,
                company_name,
                company_domain,
            ))],
            CreateCommands::EmailValidation { emails } => emails
                .into_iter()
                .map(|email| CreateJobRequest::EmailValidation(ValidateEmail { email }))
                .collect(),
            CreateCommands::LinkedinExtraction { urls } => urls
                .into_iter()
                .map(|url| CreateJobRequest::LinkedinExtraction(ExtractLinkedin { url }))
                .collect(),
        }
    }
}

/// Create one job per input
pub async fn create_jobs(command: CreateCommands, config: &Config) -> Result<()> {
    let operations = command.into_requests().into_iter().map(Operation::Create);
    let records = execute_all(operations, config).await?;

    output::print_record_lines(&records);
    output::print_summary(&records, "job(s) created");
    output::print_records(&records)
}

/// Fetch and display jobs by ID
pub async fn get_jobs(resource: Resource, job_ids: Vec<String>, config: &Config) -> Result<()> {
    let operations = job_ids
        .into_iter()
        .map(|job_id| Operation::Get { resource, job_id });
    let records = execute_all(operations, config).await?;

    output::print_record_lines(&records);
    output::print_records(&records)
}

/// List all jobs of a resource
pub async fn list_jobs(resource: Resource, config: &Config) -> Result<()> {
    let records = execute_all(std::iter::once(Operation::List { resource }), config).await?;

    if records.is_empty() {
        eprintln!("{}", format!("No {} jobs found.", resource.label()).yellow());
    } else {
        eprintln!(
            "{}",
            format!("Found {} {} job(s):", records.len(), resource.label()).bold()
        );
        output::print_record_lines(&records);
    }

    output::print_records(&records)
}

async fn execute_all(
    operations: impl IntoIterator<Item = Operation>,
    config: &Config,
) -> Result<Vec<serde_json::Value>> {
    let client = config.client()?;

    let records = run_batch(operations, config.continue_on_fail, |operation| {
        let client = client.clone();
        async move { client.execute(&operation).await }
    })
    .await?;

    Ok(records)
}
