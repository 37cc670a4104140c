//! Poll command handler
//!
//! Runs the polling trigger against a cursor stored on disk: once per
//! invocation by default, or on an interval with `--watch`.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, value_parser};
use colored::*;
use evaboot_client::JobFetcher;
use evaboot_core::domain::cursor::{PollCursor, TriggerOn};
use evaboot_core::domain::resource::Resource;
use evaboot_runner::scheduler::{CursorStore, JobPoller, PollingTrigger, TriggerHandle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::output;

#[derive(Args)]
pub struct PollArgs {
    /// Resource whose jobs are polled
    pub resource: Resource,

    /// Which job outcomes are emitted
    #[arg(long, default_value_t = TriggerOn::Completed)]
    pub trigger_on: TriggerOn,

    /// File holding the poll cursor between runs
    #[arg(long, env = "EVABOOT_STATE_FILE")]
    pub state_file: PathBuf,

    /// Keep polling until interrupted
    #[arg(long)]
    pub watch: bool,

    /// Seconds between two polls with --watch
    #[arg(long, default_value_t = 60, value_parser = value_parser!(u64).range(1..))]
    pub interval_secs: u64,
}

pub async fn poll_jobs(args: PollArgs, config: &Config) -> Result<()> {
    let fetcher: Arc<dyn JobFetcher> = config.client()?;
    let poller = JobPoller::new(fetcher, args.resource, args.trigger_on);
    let store = CursorStore::new(args.state_file);

    if args.watch {
        watch(poller, store, Duration::from_secs(args.interval_secs)).await
    } else {
        poll_once(poller, store).await
    }
}

/// A single tick; the updated cursor is stored before anything is printed
async fn poll_once(poller: JobPoller, store: CursorStore) -> Result<()> {
    let cursor = match store.load().await? {
        Some(cursor) => cursor,
        None => {
            let cursor = PollCursor::starting_at(Utc::now());
            store.save(&cursor).await?;
            eprintln!(
                "{}",
                format!(
                    "Started a new cursor at {} in {}",
                    cursor.last_poll_time,
                    store.path().display()
                )
                .dimmed()
            );
            cursor
        }
    };

    let result = poller.tick(&cursor).await;
    if result.cursor != cursor {
        store
            .save(&result.cursor)
            .await
            .context("Failed to store poll cursor")?;
    }

    let Some(emission) = result.emission else {
        eprintln!("{}", "No new jobs.".yellow());
        return Ok(());
    };

    let records = emission.into_records();
    output::print_record_lines(&records);
    output::print_records(&records)
}

/// Run the trigger until ctrl-c, printing each emission as it arrives
async fn watch(poller: JobPoller, store: CursorStore, interval: Duration) -> Result<()> {
    let trigger = PollingTrigger::new(poller, interval).with_store(store);
    let cursor = trigger.initial_cursor().await?;

    let handle = TriggerHandle::default();
    let (sender, mut records) = mpsc::channel(16);
    let task = tokio::spawn(trigger.run(cursor, sender, handle.clone()));

    let stopper = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stopper.shutdown();
        }
    });

    while let Some(batch) = records.recv().await {
        output::print_record_lines(&batch);
        output::print_records(&batch)?;
    }

    let cursor = task.await.context("Polling trigger panicked")?;
    eprintln!(
        "{}",
        format!(
            "Stopped; {} job(s) processed so far",
            cursor.processed_job_ids.len()
        )
        .dimmed()
    );
    Ok(())
}
