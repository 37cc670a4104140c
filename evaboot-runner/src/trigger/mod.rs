//! Webhook trigger
//!
//! Push-based counterpart of the polling trigger: Evaboot posts a payload
//! when a job finishes, and only the events a subscription asked for are
//! forwarded.

pub mod webhook;

pub use webhook::{WebhookRegistration, WebhookTrigger};
