//! Evaboot HTTP Client
//!
//! A small, type-safe HTTP client for the Evaboot lead-enrichment API.
//!
//! Every Evaboot resource (email finder, email validation, LinkedIn
//! extraction) is a collection of asynchronous jobs. This crate creates,
//! fetches and lists those jobs, and exposes the [`JobFetcher`] seam the
//! runner's convergence loops are written against.
//!
//! # Example
//!
//! ```no_run
//! use evaboot_client::{Credentials, EvabootClient};
//! use evaboot_core::domain::resource::Resource;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = EvabootClient::new(Credentials::new("my-token"));
//!
//!     let jobs = client.list_jobs(Resource::EmailFinder).await?;
//!     println!("Found {} email finder job(s)", jobs.len());
//!     Ok(())
//! }
//! ```

pub mod error;
mod fetcher;
mod jobs;
pub mod operation;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use fetcher::JobFetcher;
pub use operation::Operation;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;

/// Production API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.evaboot.com";

/// Path probed to check that a token is accepted
const CREDENTIAL_PROBE_PATH: &str = "/v1/email-finder/";

/// API token used to authenticate every request
#[derive(Clone)]
pub struct Credentials {
    api_token: String,
}

impl Credentials {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
        }
    }

    /// Value of the `Authorization` header
    fn authorization(&self) -> String {
        format!("Token {}", self.api_token)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_token", &"<redacted>")
            .finish()
    }
}

/// HTTP client for the Evaboot API
///
/// Methods are organized by concern:
/// - Job lifecycle (create, get, list, list since a watermark)
/// - Generic (resource, operation) dispatch through [`Operation`]
/// - Credential verification
#[derive(Debug, Clone)]
pub struct EvabootClient {
    /// Base URL of the API (e.g., "https://api.evaboot.com")
    base_url: String,
    /// Token sent with every request
    credentials: Credentials,
    /// HTTP client instance
    client: Client,
}

impl EvabootClient {
    /// Create a client for the production API
    ///
    /// # Example
    /// ```
    /// use evaboot_client::{Credentials, EvabootClient};
    ///
    /// let client = EvabootClient::new(Credentials::new("my-token"));
    /// assert_eq!(client.base_url(), "https://api.evaboot.com");
    /// ```
    pub fn new(credentials: Credentials) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, credentials)
    }

    /// Create a client for a different API host (staging, a local mock)
    pub fn with_base_url(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self::with_client(base_url, credentials, Client::new())
    }

    /// Create a client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use evaboot_client::{Credentials, EvabootClient};
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = EvabootClient::with_client(
    ///     "https://api.evaboot.com",
    ///     Credentials::new("my-token"),
    ///     http_client,
    /// );
    /// ```
    pub fn with_client(
        base_url: impl Into<String>,
        credentials: Credentials,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            client,
        }
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the configured token is accepted
    ///
    /// Issues a lightweight GET against the email finder collection.
    pub async fn verify_credentials(&self) -> Result<()> {
        let response = self
            .request(Method::GET, CREDENTIAL_PROBE_PATH)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Start an authenticated request against an API path
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, url)
            .header(AUTHORIZATION, self.credentials.authorization())
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is not needed
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}
