//! Scheduler layer for the runner
//!
//! Drives a [`JobPoller`] from three entry points that all share the same
//! tick: once eagerly on activation, on a fixed interval, and on manual
//! request through a [`TriggerHandle`]. Ticks never overlap; the loop owns
//! the cursor and replaces it only after a tick has fully completed.

pub mod poller;
pub mod store;

pub use poller::{Emission, JobPoller, TickResult};
pub use store::CursorStore;

use anyhow::Result;
use chrono::Utc;
use evaboot_core::domain::cursor::PollCursor;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Notify, mpsc};
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Control side of a running [`PollingTrigger`]
#[derive(Debug, Clone, Default)]
pub struct TriggerHandle {
    manual: Arc<Notify>,
    shutdown: CancellationToken,
}

impl TriggerHandle {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            manual: Arc::new(Notify::new()),
            shutdown,
        }
    }

    /// Requests an immediate poll
    ///
    /// Requests made while a tick is running are coalesced into one.
    pub fn trigger_now(&self) {
        self.manual.notify_one();
    }

    /// Stops the trigger; an in-flight fetch is abandoned
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

/// Recurring polling trigger
pub struct PollingTrigger {
    poller: JobPoller,
    interval: Duration,
    store: Option<CursorStore>,
}

impl PollingTrigger {
    pub fn new(poller: JobPoller, interval: Duration) -> Self {
        Self {
            poller,
            interval,
            store: None,
        }
    }

    /// Persists the cursor after every tick that changes it
    pub fn with_store(mut self, store: CursorStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Cursor to start from: the stored one, or a fresh one starting now
    ///
    /// A fresh cursor is stored right away so that a restart resumes from
    /// the first activation time.
    pub async fn initial_cursor(&self) -> Result<PollCursor> {
        let Some(store) = &self.store else {
            return Ok(PollCursor::starting_at(Utc::now()));
        };

        if let Some(cursor) = store.load().await? {
            info!(
                "Resuming from {} ({} job(s) already processed)",
                cursor.last_poll_time,
                cursor.processed_job_ids.len()
            );
            return Ok(cursor);
        }

        let cursor = PollCursor::starting_at(Utc::now());
        store.save(&cursor).await?;
        Ok(cursor)
    }

    /// Runs until the handle is shut down, returning the last cursor
    ///
    /// Every emission is sent to `output` as a list of JSON records.
    pub async fn run(
        self,
        mut cursor: PollCursor,
        output: mpsc::Sender<Vec<Value>>,
        handle: TriggerHandle,
    ) -> PollCursor {
        info!(
            "Starting polling trigger for {} jobs (interval: {:?}, trigger on: {})",
            self.poller.resource(),
            self.interval,
            self.poller.trigger_on()
        );

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        match self.poll(&cursor, &output, &handle.shutdown).await {
            Some(next) => cursor = next,
            None => return cursor,
        }

        loop {
            tokio::select! {
                biased;
                _ = handle.shutdown.cancelled() => break,
                _ = ticker.tick() => debug!("Scheduled poll"),
                _ = handle.manual.notified() => debug!("Manual poll requested"),
            }

            match self.poll(&cursor, &output, &handle.shutdown).await {
                Some(next) => cursor = next,
                None => break,
            }
        }

        info!("Polling trigger stopped");
        cursor
    }

    /// One tick; `None` when shutdown interrupted it
    async fn poll(
        &self,
        cursor: &PollCursor,
        output: &mpsc::Sender<Vec<Value>>,
        shutdown: &CancellationToken,
    ) -> Option<PollCursor> {
        let result = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                debug!("Poll abandoned by shutdown");
                return None;
            }
            result = self.poller.tick(cursor) => result,
        };

        // An emitted job is always already recorded in the stored cursor
        if result.cursor != *cursor {
            if let Some(store) = &self.store {
                if let Err(e) = store.save(&result.cursor).await {
                    warn!("Failed to persist poll cursor: {:#}", e);
                }
            }
        }

        if let Some(emission) = result.emission {
            if output.send(emission.into_records()).await.is_err() {
                warn!("Emission receiver dropped, records discarded");
            }
        }

        Some(result.cursor)
    }
}
