//! Configuration module
//!
//! Handles CLI configuration: API credentials, endpoint and batch behaviour.

use anyhow::{Context, Result};
use evaboot_client::{Credentials, EvabootClient};
use std::sync::Arc;
use std::time::Duration;

/// Timeout applied to every API request made by the CLI
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Evaboot API token
    pub api_token: String,
    /// Base URL of the Evaboot API
    pub base_url: String,
    /// Turn failed items into error records instead of aborting
    pub continue_on_fail: bool,
}

impl Config {
    /// Builds an authenticated client for this configuration
    pub fn client(&self) -> Result<Arc<EvabootClient>> {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Arc::new(EvabootClient::with_client(
            self.base_url.clone(),
            Credentials::new(self.api_token.clone()),
            http_client,
        )))
    }
}
