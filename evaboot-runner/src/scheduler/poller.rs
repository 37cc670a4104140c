//! Job poller
//!
//! One tick of a polling trigger: list the jobs created since the cursor's
//! watermark, drop the ones already emitted or not matching the trigger
//! condition, and advance the cursor when something new was found.

use chrono::Utc;
use evaboot_client::JobFetcher;
use evaboot_core::domain::cursor::{PollCursor, TriggerOn};
use evaboot_core::domain::job::Job;
use evaboot_core::domain::resource::Resource;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::batch::error_record;

/// What a tick hands to the host
#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    /// Newly observed jobs matching the trigger condition
    Jobs(Vec<Job>),
    /// The fetch failed; emitted instead of aborting the schedule
    Error(String),
}

impl Emission {
    /// JSON records in the shape downstream consumers receive
    pub fn into_records(self) -> Vec<Value> {
        match self {
            Emission::Jobs(jobs) => jobs.into_iter().map(Value::from).collect(),
            Emission::Error(message) => vec![error_record(message)],
        }
    }
}

/// Outcome of a single tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickResult {
    /// `None` when nothing new was found
    pub emission: Option<Emission>,
    /// Cursor to pass into the next tick
    pub cursor: PollCursor,
}

/// Polls one resource for newly finished jobs
#[derive(Clone)]
pub struct JobPoller {
    fetcher: Arc<dyn JobFetcher>,
    resource: Resource,
    trigger_on: TriggerOn,
}

impl JobPoller {
    /// Creates a new job poller
    pub fn new(fetcher: Arc<dyn JobFetcher>, resource: Resource, trigger_on: TriggerOn) -> Self {
        Self {
            fetcher,
            resource,
            trigger_on,
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn trigger_on(&self) -> TriggerOn {
        self.trigger_on
    }

    /// Performs a single poll
    ///
    /// The input cursor is never modified; the returned one only differs
    /// from it when a non-empty batch was found. Fetch errors are turned into
    /// an [`Emission::Error`] with the cursor left as it was.
    pub async fn tick(&self, cursor: &PollCursor) -> TickResult {
        let jobs = match self
            .fetcher
            .list_jobs_since(self.resource, cursor.last_poll_time)
            .await
        {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!("Failed to poll {} jobs: {}", self.resource, e);
                return TickResult {
                    emission: Some(Emission::Error(e.to_string())),
                    cursor: cursor.clone(),
                };
            }
        };

        let fetched = jobs.len();
        let mut next = cursor.clone();
        let mut batch = Vec::new();

        for job in jobs {
            if next.is_processed(job.id()) {
                continue;
            }
            if !self.trigger_on.matches(job.status()) {
                continue;
            }
            next.mark_processed(job.id().to_string());
            batch.push(job);
        }

        if batch.is_empty() {
            debug!(
                "No new {} jobs matching '{}' ({} fetched)",
                self.resource, self.trigger_on, fetched
            );
            return TickResult {
                emission: None,
                cursor: cursor.clone(),
            };
        }

        next.advance_to(Utc::now());
        info!(
            "Found {} new {} job(s) matching '{}'",
            batch.len(),
            self.resource,
            self.trigger_on
        );

        TickResult {
            emission: Some(Emission::Jobs(batch)),
            cursor: next,
        }
    }
}
