//! Runner configuration
//!
//! Defines all configurable parameters of the trigger daemon: API
//! connection, which jobs to poll for and how often, where the cursor is
//! kept, and which webhook events are forwarded.

use anyhow::{Context, Result};
use evaboot_core::domain::cursor::TriggerOn;
use evaboot_core::domain::event::EventType;
use evaboot_core::domain::resource::Resource;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::trigger::webhook::DEFAULT_EVENTS;

/// Runner configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Evaboot API token
    pub api_token: String,

    /// API base URL (e.g., "https://api.evaboot.com")
    pub base_url: String,

    /// Resource whose jobs are polled
    pub resource: Resource,

    /// Which job outcomes are emitted
    pub trigger_on: TriggerOn,

    /// How often to poll for new jobs
    pub poll_interval: Duration,

    /// Where the poll cursor is persisted; in memory only when unset
    pub state_file: Option<PathBuf>,

    /// Address of the webhook / control HTTP server
    pub bind_addr: String,

    /// Webhook events forwarded downstream
    pub webhook_events: Vec<EventType>,

    /// Timeout of a single API request
    pub http_timeout: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(api_token: String) -> Self {
        Self {
            api_token,
            base_url: evaboot_client::DEFAULT_BASE_URL.to_string(),
            resource: Resource::default(),
            trigger_on: TriggerOn::default(),
            poll_interval: Duration::from_secs(60),
            state_file: None,
            bind_addr: "0.0.0.0:8090".to_string(),
            webhook_events: DEFAULT_EVENTS.to_vec(),
            http_timeout: Duration::from_secs(30),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - EVABOOT_API_TOKEN (required)
    /// - EVABOOT_BASE_URL (optional, default: https://api.evaboot.com)
    /// - EVABOOT_RESOURCE (optional, default: email-finder)
    /// - EVABOOT_TRIGGER_ON (optional, completed | failed | any, default: completed)
    /// - POLL_INTERVAL (optional, seconds, default: 60)
    /// - EVABOOT_STATE_FILE (optional)
    /// - EVABOOT_BIND_ADDR (optional, default: 0.0.0.0:8090)
    /// - EVABOOT_WEBHOOK_EVENTS (optional, comma separated, default: email_finder_complete)
    /// - HTTP_TIMEOUT (optional, seconds, default: 30)
    pub fn from_env() -> Result<Self> {
        let api_token = std::env::var("EVABOOT_API_TOKEN")
            .map_err(|_| anyhow::anyhow!("EVABOOT_API_TOKEN environment variable not set"))?;

        let mut config = Self::new(api_token);

        if let Ok(base_url) = std::env::var("EVABOOT_BASE_URL") {
            config.base_url = base_url;
        }

        if let Some(resource) = parse_var::<Resource>("EVABOOT_RESOURCE")? {
            config.resource = resource;
        }

        if let Some(trigger_on) = parse_var::<TriggerOn>("EVABOOT_TRIGGER_ON")? {
            config.trigger_on = trigger_on;
        }

        config.poll_interval = std::env::var("POLL_INTERVAL")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(config.poll_interval);

        config.state_file = std::env::var_os("EVABOOT_STATE_FILE").map(PathBuf::from);

        if let Ok(bind_addr) = std::env::var("EVABOOT_BIND_ADDR") {
            config.bind_addr = bind_addr;
        }

        if let Ok(events) = std::env::var("EVABOOT_WEBHOOK_EVENTS") {
            config.webhook_events =
                parse_events(&events).context("Invalid EVABOOT_WEBHOOK_EVENTS")?;
        }

        config.http_timeout = std::env::var("HTTP_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(config.http_timeout);

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_token.trim().is_empty() {
            anyhow::bail!("api_token cannot be empty");
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            anyhow::bail!("base_url must start with http:// or https://");
        }

        if self.poll_interval.as_secs() == 0 {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.http_timeout.as_secs() == 0 {
            anyhow::bail!("http_timeout must be greater than 0");
        }

        if self.webhook_events.is_empty() {
            anyhow::bail!("at least one webhook event must be subscribed");
        }

        Ok(())
    }
}

/// Parses an optional variable with the type's `FromStr`
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr<Err = String>,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", name, e)),
        Err(_) => Ok(None),
    }
}

/// Parses a comma separated list of webhook events
pub fn parse_events(list: &str) -> Result<Vec<EventType>> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| name.parse::<EventType>().map_err(anyhow::Error::msg))
        .collect()
}
