//! Error types for job convergence

use evaboot_client::ClientError;
use evaboot_core::domain::job::JobStatus;
use std::time::Duration;
use thiserror::Error;

/// Errors that end a wait for a remote job
#[derive(Debug, Error)]
pub enum WaitError {
    /// Required input is missing or out of range
    #[error("{0}")]
    Validation(String),

    /// The remote job reached a terminal failure or was cancelled
    #[error("Job {job_id} {status}: {message}")]
    JobFailed {
        job_id: String,
        status: JobStatus,
        message: String,
    },

    /// The deadline passed while the job was still in flight
    #[error("Job {job_id} did not complete within {}", describe_duration(.max_wait))]
    Timeout { job_id: String, max_wait: Duration },

    /// The API could not be reached or rejected the request
    #[error(transparent)]
    Transport(#[from] ClientError),

    /// The wait was interrupted by shutdown
    #[error("Wait for job {job_id} was cancelled")]
    Cancelled { job_id: String },
}

impl WaitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }
}

/// Renders a duration the way wait limits are configured
pub fn describe_duration(duration: &Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 && secs % 60 == 0 && duration.subsec_nanos() == 0 {
        let minutes = secs / 60;
        format!("{} minute{}", minutes, if minutes == 1 { "" } else { "s" })
    } else {
        format!("{:?}", duration)
    }
}
