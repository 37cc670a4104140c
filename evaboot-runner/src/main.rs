//! Evaboot Runner
//!
//! A long-running trigger daemon that turns Evaboot job completions into a
//! stream of JSON records on stdout.
//!
//! Architecture:
//! - Configuration: Load settings from environment variables
//! - Client: authenticated HTTP access to the Evaboot API
//! - Scheduler: the polling trigger, with an optional persisted cursor
//! - API: webhook receiver and manual poll endpoint
//!
//! Both triggers feed the same output channel; every emission is printed as
//! one JSON line.

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use evaboot_client::{Credentials, EvabootClient, JobFetcher};
use evaboot_runner::api::{self, AppState};
use evaboot_runner::config::Config;
use evaboot_runner::scheduler::{CursorStore, JobPoller, PollingTrigger, TriggerHandle};
use evaboot_runner::trigger::{WebhookRegistration, WebhookTrigger};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; stdout carries the emitted records
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "evaboot_runner=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting Evaboot Runner");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;
    info!(
        "Loaded configuration: base_url={}, resource={}, trigger_on={}",
        config.base_url, config.resource, config.trigger_on
    );

    // Initialize Evaboot client
    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .context("Failed to build HTTP client")?;
    let client = Arc::new(EvabootClient::with_client(
        config.base_url.clone(),
        Credentials::new(config.api_token.clone()),
        http_client,
    ));

    verify_with_retry(&client).await?;
    info!("Credentials verified");

    let shutdown = CancellationToken::new();
    let handle = TriggerHandle::new(shutdown.clone());
    let (output, records) = mpsc::channel::<Vec<Value>>(64);
    let printer = tokio::spawn(print_records(records));

    // Polling trigger
    let fetcher: Arc<dyn JobFetcher> = client;
    let poller = JobPoller::new(fetcher, config.resource, config.trigger_on);
    let mut trigger = PollingTrigger::new(poller, config.poll_interval);
    if let Some(path) = &config.state_file {
        info!("Persisting poll cursor to {}", path.display());
        trigger = trigger.with_store(CursorStore::new(path.clone()));
    }
    let cursor = trigger
        .initial_cursor()
        .await
        .context("Failed to load poll cursor")?;
    let polling = tokio::spawn(trigger.run(cursor, output.clone(), handle.clone()));

    // Webhook trigger
    let mut registration = WebhookRegistration::default();
    registration.create(&config.webhook_events, Utc::now());
    info!(
        "Webhook subscription {} ({} event(s))",
        registration.webhook_id.as_deref().unwrap_or_default(),
        registration.events.len()
    );
    let registration = Arc::new(Mutex::new(registration));

    let state = AppState {
        webhook: Arc::new(WebhookTrigger::new(config.webhook_events.iter().copied())),
        registration: registration.clone(),
        trigger: handle.clone(),
        output,
    };
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Webhook server listening on {}", config.bind_addr);

    tokio::spawn(shutdown_on_ctrl_c(shutdown.clone()));

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await
    {
        error!("Server error: {}", e);
        shutdown.cancel();
    }

    let cursor = polling.await.context("Polling trigger panicked")?;
    info!(
        "Last poll at {} ({} job(s) processed)",
        cursor.last_poll_time,
        cursor.processed_job_ids.len()
    );

    match registration.lock() {
        Ok(mut registration) => {
            registration.delete();
            info!("Webhook subscription removed");
        }
        Err(e) => warn!("Could not clear webhook subscription: {}", e),
    }

    // The router and the trigger held the last senders; the printer drains
    printer.await.context("Output writer panicked")?;

    info!("Evaboot Runner stopped");
    Ok(())
}

/// Writes every emission as one JSON line on stdout
async fn print_records(mut records: mpsc::Receiver<Vec<Value>>) {
    let mut stdout = tokio::io::stdout();

    while let Some(batch) = records.recv().await {
        let line = match serde_json::to_string(&batch) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize records: {}", e);
                continue;
            }
        };

        if let Err(e) = stdout.write_all(format!("{}\n", line).as_bytes()).await {
            error!("Failed to write records: {}", e);
            return;
        }
        if let Err(e) = stdout.flush().await {
            error!("Failed to flush records: {}", e);
            return;
        }
    }
}

async fn shutdown_on_ctrl_c(shutdown: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => error!("Failed to listen for ctrl-c: {}", e),
    }
    shutdown.cancel();
}

/// Verify the API token with retry logic and exponential backoff
///
/// Rejected credentials fail immediately; only transport and server errors
/// are retried.
async fn verify_with_retry(client: &EvabootClient) -> Result<()> {
    const MAX_RETRIES: u32 = 10;
    const INITIAL_DELAY_MS: u64 = 500;
    const MAX_DELAY_MS: u64 = 30_000;

    let mut attempt = 0;
    let mut delay_ms = INITIAL_DELAY_MS;

    loop {
        attempt += 1;

        match client.verify_credentials().await {
            Ok(()) => {
                if attempt > 1 {
                    info!("Reached Evaboot after {} attempt(s)", attempt);
                }
                return Ok(());
            }
            Err(e) if e.is_unauthorized() => {
                return Err(anyhow::anyhow!("Evaboot rejected the API token: {}", e));
            }
            Err(e) => {
                if attempt >= MAX_RETRIES {
                    error!("Failed to reach Evaboot after {} attempts", MAX_RETRIES);
                    return Err(anyhow::anyhow!("Failed to verify credentials: {}", e));
                }

                warn!(
                    "Failed to reach Evaboot (attempt {}/{}): {}",
                    attempt, MAX_RETRIES, e
                );
                warn!("Retrying in {} ms...", delay_ms);

                tokio::time::sleep(Duration::from_millis(delay_ms)).await;

                // Exponential backoff with cap
                delay_ms = (delay_ms * 2).min(MAX_DELAY_MS);
            }
        }
    }
}
