//! Active job waiter
//!
//! Polls a single remote job until it completes, fails, or the configured
//! deadline passes. The pause between checks is a tokio timer, so a waiting
//! job never holds a worker thread.

use evaboot_client::JobFetcher;
use evaboot_core::domain::job::{Job, JobStatus, StatusClass};
use evaboot_core::domain::resource::Resource;
use evaboot_core::dto::job::WaitSummary;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::WaitError;

/// Default upper bound on a wait
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(30 * 60);

/// Default pause between two status checks
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Accepted max wait, in minutes, for user-facing configuration
pub const MAX_WAIT_MINUTES: std::ops::RangeInclusive<u64> = 1..=240;

/// Accepted check interval, in seconds, for user-facing configuration
pub const CHECK_INTERVAL_SECONDS: std::ops::RangeInclusive<u64> = 5..=300;

/// Where the ID of the job to wait for comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobIdSource {
    /// A fixed ID
    Manual(String),
    /// A field of the upstream item (usually the output of a create call)
    Field(String),
}

impl Default for JobIdSource {
    fn default() -> Self {
        JobIdSource::Field("id".to_string())
    }
}

impl JobIdSource {
    /// Resolves the job ID for one upstream item
    pub fn resolve(&self, item: &Value) -> Result<String, WaitError> {
        let job_id = match self {
            JobIdSource::Manual(job_id) => Some(job_id.trim().to_string()),
            JobIdSource::Field(field) => match item.get(field.as_str()) {
                Some(Value::String(job_id)) => Some(job_id.trim().to_string()),
                Some(Value::Number(job_id)) => Some(job_id.to_string()),
                _ => None,
            },
        };

        match job_id {
            Some(job_id) if !job_id.is_empty() => Ok(job_id),
            _ => Err(WaitError::Validation("Job ID is required".to_string())),
        }
    }
}

/// Parameters of a single wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitRequest {
    pub resource: Resource,
    pub job_id: String,
    pub max_wait: Duration,
    pub check_interval: Duration,
    /// Return the full job payload instead of a [`WaitSummary`]
    pub return_job_data: bool,
}

impl WaitRequest {
    pub fn new(resource: Resource, job_id: impl Into<String>) -> Self {
        Self {
            resource,
            job_id: job_id.into(),
            max_wait: DEFAULT_MAX_WAIT,
            check_interval: DEFAULT_CHECK_INTERVAL,
            return_job_data: true,
        }
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn with_check_interval(mut self, check_interval: Duration) -> Self {
        self.check_interval = check_interval;
        self
    }

    pub fn with_return_job_data(mut self, return_job_data: bool) -> Self {
        self.return_job_data = return_job_data;
        self
    }

    fn validate(&self) -> Result<(), WaitError> {
        if self.job_id.trim().is_empty() {
            return Err(WaitError::Validation("Job ID is required".to_string()));
        }
        if self.max_wait.is_zero() {
            return Err(WaitError::Validation(
                "max wait must be greater than 0".to_string(),
            ));
        }
        if self.check_interval.is_zero() {
            return Err(WaitError::Validation(
                "check interval must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of a successful wait
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
    /// The final job payload
    Job(Job),
    /// Only the job ID, final status and time spent waiting
    Summary(WaitSummary),
}

impl From<WaitOutcome> for Value {
    fn from(outcome: WaitOutcome) -> Self {
        match outcome {
            WaitOutcome::Job(job) => Value::from(job),
            WaitOutcome::Summary(summary) => serde_json::json!({
                "jobId": summary.job_id,
                "status": summary.status,
                "waitTime": summary.wait_time,
            }),
        }
    }
}

/// Waits for remote jobs to reach a terminal state
///
/// The waiter keeps no state across calls; every [`JobWaiter::wait`] is
/// independent.
#[derive(Clone)]
pub struct JobWaiter {
    fetcher: Arc<dyn JobFetcher>,
    shutdown: CancellationToken,
}

impl JobWaiter {
    pub fn new(fetcher: Arc<dyn JobFetcher>) -> Self {
        Self {
            fetcher,
            shutdown: CancellationToken::new(),
        }
    }

    /// Interrupts in-flight waits when the token is cancelled
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Polls the job until it completes
    ///
    /// Fails immediately on `failed` or `cancelled`, and with
    /// [`WaitError::Timeout`] once `max_wait` has elapsed. The deadline is
    /// checked after every pause, so no fetch is issued past it. Fetch errors
    /// are returned as they are, without retrying.
    pub async fn wait(&self, request: &WaitRequest) -> Result<WaitOutcome, WaitError> {
        request.validate()?;

        let job_id = request.job_id.trim();
        let started = Instant::now();
        let mut checks: u32 = 0;

        loop {
            let job = tokio::select! {
                _ = self.shutdown.cancelled() => return Err(self.cancelled(job_id)),
                fetched = self.fetcher.fetch_job(request.resource, job_id) => fetched?,
            };
            checks += 1;

            match job.status().classify() {
                StatusClass::Complete => {
                    let waited = started.elapsed();
                    info!(
                        "Job {} completed after {} check(s) ({:?})",
                        job_id, checks, waited
                    );
                    return Ok(Self::outcome(request, job_id, job, waited));
                }
                StatusClass::Failed => {
                    return Err(WaitError::JobFailed {
                        job_id: job_id.to_string(),
                        message: job.failure_message().to_string(),
                        status: job.status().clone(),
                    });
                }
                StatusClass::InFlight => {}
            }

            if started.elapsed() >= request.max_wait {
                return Err(Self::timeout(request, job_id));
            }

            debug!(
                "Job {} is {} (check {}), next check in {:?}",
                job_id, job.status(), checks, request.check_interval
            );

            tokio::select! {
                _ = self.shutdown.cancelled() => return Err(self.cancelled(job_id)),
                _ = time::sleep(request.check_interval) => {}
            }

            if started.elapsed() >= request.max_wait {
                return Err(Self::timeout(request, job_id));
            }
        }
    }

    fn outcome(request: &WaitRequest, job_id: &str, job: Job, waited: Duration) -> WaitOutcome {
        if request.return_job_data {
            WaitOutcome::Job(job)
        } else {
            WaitOutcome::Summary(WaitSummary {
                job_id: job_id.to_string(),
                status: JobStatus::Complete,
                wait_time: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
            })
        }
    }

    fn timeout(request: &WaitRequest, job_id: &str) -> WaitError {
        WaitError::Timeout {
            job_id: job_id.to_string(),
            max_wait: request.max_wait,
        }
    }

    fn cancelled(&self, job_id: &str) -> WaitError {
        debug!("Wait for job {} interrupted by shutdown", job_id);
        WaitError::Cancelled {
            job_id: job_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, ScriptedFetcher, job};
    use serde_json::json;

    fn waiter(fetcher: &Arc<ScriptedFetcher>) -> JobWaiter {
        JobWaiter::new(fetcher.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_payload_once_complete() {
        let done = Job::from_payload(json!({"id": "j1", "status": "complete", "value": 42})).unwrap();
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            Reply::Job(job("j1", "processing")),
            Reply::Job(done),
        ]));

        let started = Instant::now();
        let request = WaitRequest::new(Resource::EmailFinder, "j1")
            .with_check_interval(Duration::from_secs(1))
            .with_max_wait(Duration::from_secs(10));
        let outcome = waiter(&fetcher).wait(&request).await.unwrap();

        match outcome {
            WaitOutcome::Job(job) => {
                assert_eq!(job.status(), &JobStatus::Complete);
                assert_eq!(job.get("value"), Some(&json!(42)));
            }
            other => panic!("expected full payload, got {:?}", other),
        }
        assert_eq!(fetcher.call_count(), 2);
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_fails_immediately() {
        let failed = Job::from_payload(
            json!({"id": "j2", "status": "failed", "error_message": "bad input"}),
        )
        .unwrap();
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Reply::Job(failed)]));

        let started = Instant::now();
        let err = waiter(&fetcher)
            .wait(&WaitRequest::new(Resource::EmailValidation, "j2"))
            .await
            .unwrap_err();

        assert!(matches!(err, WaitError::JobFailed { .. }));
        assert!(err.to_string().contains("bad input"));
        assert_eq!(fetcher.call_count(), 1);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_job_fails_with_generic_message() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            Reply::Job(job("j3", "pending")),
            Reply::Job(job("j3", "cancelled")),
        ]));

        let err = waiter(&fetcher)
            .wait(
                &WaitRequest::new(Resource::LinkedinExtractions, "j3")
                    .with_check_interval(Duration::from_secs(5)),
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Job j3 cancelled: Unknown error");
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_without_fetching_past_deadline() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Reply::Job(job(
            "j4",
            "processing",
        ))]));

        let started = Instant::now();
        let max_wait = Duration::from_secs(10);
        let err = waiter(&fetcher)
            .wait(
                &WaitRequest::new(Resource::EmailFinder, "j4")
                    .with_check_interval(Duration::from_secs(3))
                    .with_max_wait(max_wait),
            )
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        let calls = fetcher.calls.lock().unwrap();
        // Checks at 0s, 3s, 6s and 9s; the one that would land at 12s is skipped
        assert_eq!(calls.len(), 4);
        assert!(calls.iter().all(|call| call.at - started < max_wait));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_status_keeps_waiting() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            Reply::Job(job("j5", "enriching")),
            Reply::Job(job("j5", "complete")),
        ]));

        let outcome = waiter(&fetcher)
            .wait(&WaitRequest::new(Resource::EmailFinder, "j5"))
            .await;

        assert!(outcome.is_ok());
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_propagates_without_retry() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Reply::Fail(
            503,
            "service unavailable",
        )]));

        let err = waiter(&fetcher)
            .wait(&WaitRequest::new(Resource::EmailFinder, "j6"))
            .await
            .unwrap_err();

        assert!(matches!(err, WaitError::Transport(_)));
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_summary_output() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            Reply::Job(job("j7", "processing")),
            Reply::Job(job("j7", "complete")),
        ]));

        let outcome = waiter(&fetcher)
            .wait(
                &WaitRequest::new(Resource::EmailFinder, "j7")
                    .with_check_interval(Duration::from_secs(2))
                    .with_return_job_data(false),
            )
            .await
            .unwrap();

        assert_eq!(
            Value::from(outcome),
            json!({"jobId": "j7", "status": "complete", "waitTime": 2000})
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_wait() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Reply::Job(job(
            "j8",
            "processing",
        ))]));
        let shutdown = CancellationToken::new();
        let waiter = waiter(&fetcher).with_shutdown(shutdown.clone());

        let canceller = tokio::spawn(async move {
            time::sleep(Duration::from_secs(5)).await;
            shutdown.cancel();
        });

        let err = waiter
            .wait(
                &WaitRequest::new(Resource::EmailFinder, "j8")
                    .with_check_interval(Duration::from_secs(3)),
            )
            .await
            .unwrap_err();
        canceller.await.unwrap();

        assert!(matches!(err, WaitError::Cancelled { .. }));
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test]
    async fn test_rejects_invalid_requests() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![]));
        let waiter = waiter(&fetcher);

        let empty_id = WaitRequest::new(Resource::EmailFinder, "  ");
        assert!(matches!(
            waiter.wait(&empty_id).await,
            Err(WaitError::Validation(_))
        ));

        let zero_interval =
            WaitRequest::new(Resource::EmailFinder, "j9").with_check_interval(Duration::ZERO);
        assert!(matches!(
            waiter.wait(&zero_interval).await,
            Err(WaitError::Validation(_))
        ));

        assert_eq!(fetcher.call_count(), 0);
    }

    #[test]
    fn test_job_id_from_upstream_item() {
        let source = JobIdSource::default();
        assert_eq!(source.resolve(&json!({"id": "abc"})).unwrap(), "abc");
        assert_eq!(source.resolve(&json!({"id": 17})).unwrap(), "17");
        assert!(source.resolve(&json!({"id": ""})).is_err());
        assert!(source.resolve(&json!({"job": "abc"})).is_err());

        let custom = JobIdSource::Field("job_id".to_string());
        assert_eq!(custom.resolve(&json!({"job_id": "x1"})).unwrap(), "x1");
    }

    #[test]
    fn test_manual_job_id_ignores_item() {
        let source = JobIdSource::Manual("m1".to_string());
        assert_eq!(source.resolve(&Value::Null).unwrap(), "m1");
        assert!(
            JobIdSource::Manual(String::new())
                .resolve(&Value::Null)
                .is_err()
        );
    }
}
