//! Poll cursor and trigger conditions
//!
//! The cursor is the only state a polling trigger keeps between ticks. It is
//! owned by a single trigger registration and passed explicitly into every
//! tick, so it can be persisted and restored by the host.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::domain::job::JobStatus;

/// Watermark and seen-ID set of a polling trigger
///
/// `processed_job_ids` only ever grows. Once an ID is in it, the poller will
/// not emit that job again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollCursor {
    /// Lower bound sent as `created_at__gte` on the next fetch
    pub last_poll_time: DateTime<Utc>,
    /// IDs already emitted by this trigger
    #[serde(default)]
    pub processed_job_ids: BTreeSet<String>,
}

impl PollCursor {
    /// Creates the cursor of a freshly activated trigger
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            last_poll_time: now,
            processed_job_ids: BTreeSet::new(),
        }
    }

    pub fn is_processed(&self, job_id: &str) -> bool {
        self.processed_job_ids.contains(job_id)
    }

    /// Records a job as emitted; returns false if it already was
    pub fn mark_processed(&mut self, job_id: impl Into<String>) -> bool {
        self.processed_job_ids.insert(job_id.into())
    }

    /// Moves the watermark forward; earlier instants are ignored
    pub fn advance_to(&mut self, now: DateTime<Utc>) {
        if now > self.last_poll_time {
            self.last_poll_time = now;
        }
    }
}

/// Which job outcomes a polling trigger emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerOn {
    /// Only jobs whose status is `complete`
    #[default]
    Completed,
    /// Only jobs whose status is `failed`
    Failed,
    /// Every job, whatever its status
    Any,
}

impl TriggerOn {
    pub fn matches(&self, status: &JobStatus) -> bool {
        match self {
            TriggerOn::Completed => *status == JobStatus::Complete,
            TriggerOn::Failed => *status == JobStatus::Failed,
            TriggerOn::Any => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerOn::Completed => "completed",
            TriggerOn::Failed => "failed",
            TriggerOn::Any => "any",
        }
    }
}

impl FromStr for TriggerOn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(TriggerOn::Completed),
            "failed" => Ok(TriggerOn::Failed),
            "any" => Ok(TriggerOn::Any),
            other => Err(format!(
                "unknown trigger condition '{}' (expected completed, failed or any)",
                other
            )),
        }
    }
}

impl std::fmt::Display for TriggerOn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
