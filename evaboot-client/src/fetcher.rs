//! Job status fetching seam
//!
//! The waiter and the poller only need two reads from the API. They are
//! written against this trait so they can be driven by a scripted fetcher
//! in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use evaboot_core::domain::job::Job;
use evaboot_core::domain::resource::Resource;

use crate::EvabootClient;
use crate::error::Result;

/// Reads job snapshots from the remote service
#[async_trait]
pub trait JobFetcher: Send + Sync {
    /// Fetches the current snapshot of one job
    async fn fetch_job(&self, resource: Resource, job_id: &str) -> Result<Job>;

    /// Lists jobs created at or after `since`, newest first
    async fn list_jobs_since(&self, resource: Resource, since: DateTime<Utc>) -> Result<Vec<Job>>;
}

#[async_trait]
impl JobFetcher for EvabootClient {
    async fn fetch_job(&self, resource: Resource, job_id: &str) -> Result<Job> {
        self.get_job(resource, job_id).await
    }

    async fn list_jobs_since(&self, resource: Resource, since: DateTime<Utc>) -> Result<Vec<Job>> {
        EvabootClient::list_jobs_since(self, resource, since).await
    }
}
