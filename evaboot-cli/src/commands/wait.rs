//! Wait command handler
//!
//! Blocks until each job is complete, failed, or past its deadline. Job IDs
//! come from the command line or from upstream items read on stdin, so a
//! `create` can be piped straight into a `wait`.

use anyhow::{Context, Result};
use clap::{Args, value_parser};
use evaboot_client::JobFetcher;
use evaboot_core::domain::resource::Resource;
use evaboot_runner::batch::run_batch;
use evaboot_runner::waiter::{
    CHECK_INTERVAL_SECONDS, DEFAULT_CHECK_INTERVAL, DEFAULT_MAX_WAIT, MAX_WAIT_MINUTES,
};
use evaboot_runner::{JobIdSource, JobWaiter, WaitError, WaitRequest};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::Config;
use crate::output;

#[derive(Args)]
pub struct WaitArgs {
    /// Resource the jobs belong to
    pub resource: Resource,

    /// Job ID to wait for (repeatable)
    #[arg(long = "job-id", conflicts_with = "from_stdin")]
    pub job_ids: Vec<String>,

    /// Read upstream items (a JSON object or array) from stdin
    #[arg(long)]
    pub from_stdin: bool,

    /// Field of each stdin item holding the job ID
    #[arg(long, default_value = "id")]
    pub job_id_field: String,

    /// Give up after this many minutes
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_WAIT.as_secs() / 60,
        value_parser = value_parser!(u64).range(MAX_WAIT_MINUTES)
    )]
    pub max_wait_minutes: u64,

    /// Seconds between two status checks
    #[arg(
        long,
        default_value_t = DEFAULT_CHECK_INTERVAL.as_secs(),
        value_parser = value_parser!(u64).range(CHECK_INTERVAL_SECONDS)
    )]
    pub check_interval_secs: u64,

    /// Only output the job ID, final status and time waited
    #[arg(long)]
    pub summary: bool,
}

/// Wait for every requested job, in order
pub async fn wait_for_jobs(args: WaitArgs, config: &Config) -> Result<()> {
    let job_ids = if args.from_stdin {
        let mut input = String::new();
        tokio::io::stdin()
            .read_to_string(&mut input)
            .await
            .context("Failed to read stdin")?;

        let source = JobIdSource::Field(args.job_id_field.clone());
        parse_items(&input)?
            .iter()
            .map(|item| source.resolve(item))
            .collect::<Vec<_>>()
    } else if args.job_ids.is_empty() {
        anyhow::bail!("Job ID is required (use --job-id or --from-stdin)");
    } else {
        args.job_ids
            .iter()
            .map(|job_id| JobIdSource::Manual(job_id.clone()).resolve(&Value::Null))
            .collect()
    };
    debug!("Waiting for {} job(s)", job_ids.len());

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(shutdown.clone()));

    let fetcher: Arc<dyn JobFetcher> = config.client()?;
    let waiter = JobWaiter::new(fetcher).with_shutdown(shutdown);

    let max_wait = Duration::from_secs(args.max_wait_minutes * 60);
    let check_interval = Duration::from_secs(args.check_interval_secs);
    let resource = args.resource;
    let return_job_data = !args.summary;

    let records = run_batch(job_ids, config.continue_on_fail, |job_id| {
        let waiter = waiter.clone();
        async move {
            let request = WaitRequest::new(resource, job_id?)
                .with_max_wait(max_wait)
                .with_check_interval(check_interval)
                .with_return_job_data(return_job_data);

            let outcome = waiter.wait(&request).await?;
            Ok::<_, WaitError>(vec![Value::from(outcome)])
        }
    })
    .await?;

    output::print_record_lines(&records);
    output::print_summary(&records, "job(s) completed");
    output::print_records(&records)
}

/// Splits stdin into upstream items: an array yields its elements
fn parse_items(input: &str) -> Result<Vec<Value>> {
    if input.trim().is_empty() {
        anyhow::bail!("No items on stdin");
    }

    match serde_json::from_str(input).context("stdin is not valid JSON")? {
        Value::Array(items) => Ok(items),
        item => Ok(vec![item]),
    }
}

async fn cancel_on_ctrl_c(shutdown: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        shutdown.cancel();
    }
}
