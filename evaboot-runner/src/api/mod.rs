//! API Module
//!
//! HTTP surface of the runner daemon: the webhook receiver, the manual poll
//! trigger and a health check.

pub mod error;
pub mod health;
pub mod webhook;

use axum::{
    Router,
    routing::{get, post},
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use crate::scheduler::TriggerHandle;
use crate::trigger::{WebhookRegistration, WebhookTrigger};

/// Shared state of the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub webhook: Arc<WebhookTrigger>,
    pub registration: Arc<Mutex<WebhookRegistration>>,
    pub trigger: TriggerHandle,
    /// Where forwarded webhook records are delivered
    pub output: mpsc::Sender<Vec<Value>>,
}

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Webhook endpoints
        .route(
            "/webhook",
            post(webhook::receive_webhook).get(webhook::get_registration),
        )
        // Polling trigger
        .route("/poll", post(webhook::trigger_poll))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use chrono::Utc;
    use evaboot_core::domain::event::EventType;
    use serde_json::json;
    use tower::ServiceExt;

    fn state(events: &[EventType]) -> (AppState, mpsc::Receiver<Vec<Value>>) {
        let (output, rx) = mpsc::channel(8);
        let mut registration = WebhookRegistration::default();
        registration.create(events, Utc::now());
        let state = AppState {
            webhook: Arc::new(WebhookTrigger::new(events.iter().copied())),
            registration: Arc::new(Mutex::new(registration)),
            trigger: TriggerHandle::default(),
            output,
        };
        (state, rx)
    }

    async fn send(
        app: Router,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let body = match body {
            Some(json) => Body::from(serde_json::to_string(&json).unwrap()),
            None => Body::empty(),
        };
        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();

        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_subscribed_webhook_is_forwarded() {
        let (state, mut rx) = state(&[EventType::EmailFinderComplete]);
        let payload = json!({"job_type": "email_finder", "email": "ada@engines.example"});

        let (status, body) = send(
            create_router(state),
            Method::POST,
            "/webhook",
            Some(payload.clone()),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([payload.clone()]));
        assert_eq!(rx.recv().await.unwrap(), vec![payload]);
    }

    #[tokio::test]
    async fn test_unsubscribed_webhook_answers_empty_array() {
        let (state, mut rx) = state(&[EventType::ExtractionComplete]);

        let (status, body) = send(
            create_router(state),
            Method::POST,
            "/webhook",
            Some(json!({"job_type": "email_finder"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_registration_is_exposed() {
        let (state, _rx) = state(&[EventType::ExtractionComplete]);

        let (status, body) = send(create_router(state), Method::GET, "/webhook", None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["webhookId"].as_str().unwrap().starts_with("evaboot_"));
        assert_eq!(body["events"], json!(["extraction_complete"]));
    }

    #[tokio::test]
    async fn test_manual_poll_endpoint() {
        let (state, _rx) = state(&[EventType::EmailFinderComplete]);
        let handle = state.trigger.clone();

        let (status, _) = send(create_router(state.clone()), Method::POST, "/poll", None).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        handle.shutdown();
        let (status, body) = send(create_router(state), Method::POST, "/poll", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _rx) = state(&[EventType::EmailFinderComplete]);
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let resp = create_router(state).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
