//! Evaboot Runner
//!
//! Converges asynchronous Evaboot jobs into synchronous callers.
//!
//! Architecture:
//! - Waiter: actively polls one job until it is terminal or a deadline passes
//! - Scheduler: a polling trigger that emits newly finished jobs on every tick
//! - Trigger: webhook event classification and subscription bookkeeping
//! - Batch: continue-on-failure handling shared by every multi-item operation
//! - API: HTTP surface of the runner daemon (webhook receiver, manual polls)

pub mod api;
pub mod batch;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod trigger;
pub mod waiter;

#[cfg(test)]
pub(crate) mod testing;

pub use error::WaitError;
pub use scheduler::{Emission, JobPoller, PollingTrigger, TickResult, TriggerHandle};
pub use trigger::WebhookTrigger;
pub use waiter::{JobIdSource, JobWaiter, WaitOutcome, WaitRequest};
