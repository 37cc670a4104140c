//! Scripted fetcher shared by the runner's unit tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use evaboot_client::{ClientError, JobFetcher, Result};
use evaboot_core::domain::job::{Job, JobStatus};
use evaboot_core::domain::resource::Resource;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::time::Instant;

/// One scripted answer of the fake API
pub enum Reply {
    Job(Job),
    Jobs(Vec<Job>),
    Fail(u16, &'static str),
}

/// Fetcher that replays scripted replies in order
///
/// Once the script is exhausted the last reply repeats, which models a remote
/// job that stays in the same state.
pub struct ScriptedFetcher {
    replies: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<Reply>>,
    pub calls: Mutex<Vec<Call>>,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub at: Instant,
    pub resource: Resource,
    pub job_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
}

impl ScriptedFetcher {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_reply(&self) -> Result<Reply> {
        let mut replies = self.replies.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(reply) = replies.pop_front() {
            *last = Some(reply.duplicate());
        }
        match last.as_ref() {
            Some(reply) => Ok(reply.duplicate()),
            None => Err(ClientError::InvalidRequest("script is empty".to_string())),
        }
    }
}

impl Reply {
    fn duplicate(&self) -> Reply {
        match self {
            Reply::Job(job) => Reply::Job(job.clone()),
            Reply::Jobs(jobs) => Reply::Jobs(jobs.clone()),
            Reply::Fail(status, message) => Reply::Fail(*status, *message),
        }
    }
}

#[async_trait]
impl JobFetcher for ScriptedFetcher {
    async fn fetch_job(&self, resource: Resource, job_id: &str) -> Result<Job> {
        self.calls.lock().unwrap().push(Call {
            at: Instant::now(),
            resource,
            job_id: Some(job_id.to_string()),
            since: None,
        });
        match self.next_reply()? {
            Reply::Job(job) => Ok(job),
            Reply::Jobs(_) => Err(ClientError::ParseError("expected a job".to_string())),
            Reply::Fail(status, message) => Err(ClientError::api_error(status, message)),
        }
    }

    async fn list_jobs_since(&self, resource: Resource, since: DateTime<Utc>) -> Result<Vec<Job>> {
        self.calls.lock().unwrap().push(Call {
            at: Instant::now(),
            resource,
            job_id: None,
            since: Some(since),
        });
        match self.next_reply()? {
            Reply::Jobs(jobs) => Ok(jobs),
            Reply::Job(job) => Ok(vec![job]),
            Reply::Fail(status, message) => Err(ClientError::api_error(status, message)),
        }
    }
}

/// Shorthand for a job snapshot
pub fn job(id: &str, status: &str) -> Job {
    Job::new(id, JobStatus::from(status))
}
