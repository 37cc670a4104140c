//! Webhook event routing and subscription bookkeeping

use chrono::{DateTime, Utc};
use evaboot_core::domain::event::EventType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

/// Events subscribed to when none are configured
pub const DEFAULT_EVENTS: [EventType; 1] = [EventType::EmailFinderComplete];

/// Classifies webhook payloads and forwards the subscribed ones
#[derive(Debug, Clone)]
pub struct WebhookTrigger {
    events: HashSet<EventType>,
}

impl WebhookTrigger {
    pub fn new(events: impl IntoIterator<Item = EventType>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    pub fn subscribes_to(&self, event: EventType) -> bool {
        self.events.contains(&event)
    }

    /// Records to hand downstream for one inbound payload
    ///
    /// Returns the payload itself when its event is subscribed, otherwise an
    /// empty list. Nothing is retried, ordered or deduplicated.
    pub fn route(&self, payload: Value) -> Vec<Value> {
        let event = EventType::classify(&payload);
        if self.subscribes_to(event) {
            debug!("Forwarding {} webhook", event);
            vec![payload]
        } else {
            debug!("Ignoring {} webhook (not subscribed)", event);
            Vec::new()
        }
    }
}

impl Default for WebhookTrigger {
    fn default() -> Self {
        Self::new(DEFAULT_EVENTS)
    }
}

/// Local record of a webhook subscription
///
/// Evaboot has no subscription API, so creating a webhook only fabricates an
/// identifier; nothing is registered remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRegistration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_id: Option<String>,
    #[serde(default)]
    pub events: Vec<EventType>,
}

impl WebhookRegistration {
    pub fn check_exists(&self) -> bool {
        self.webhook_id.is_some()
    }

    /// Records a subscription to `events`, identified by the creation time
    pub fn create(&mut self, events: &[EventType], now: DateTime<Utc>) -> bool {
        self.webhook_id = Some(format!("evaboot_{}", now.timestamp_millis()));
        self.events = events.to_vec();
        true
    }

    pub fn delete(&mut self) -> bool {
        self.webhook_id = None;
        self.events.clear();
        true
    }
}
