//! Webhook and trigger API Handlers

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::trigger::WebhookRegistration;

/// POST /webhook
/// Receive an Evaboot notification and forward it if subscribed
///
/// Answers with the forwarded records, an empty array when the event was
/// filtered out.
pub async fn receive_webhook(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<Vec<Value>>> {
    let forwarded = state.webhook.route(payload);

    if !forwarded.is_empty() && state.output.send(forwarded.clone()).await.is_err() {
        return Err(ApiError::Unavailable(
            "Runner is shutting down".to_string(),
        ));
    }

    Ok(Json(forwarded))
}

/// GET /webhook
/// Current local subscription record
pub async fn get_registration(
    State(state): State<AppState>,
) -> ApiResult<Json<WebhookRegistration>> {
    let registration = state
        .registration
        .lock()
        .map_err(|e| ApiError::InternalError(format!("Registration lock poisoned: {}", e)))?;

    Ok(Json(registration.clone()))
}

/// POST /poll
/// Request an immediate poll of the polling trigger
pub async fn trigger_poll(State(state): State<AppState>) -> ApiResult<(StatusCode, Json<Value>)> {
    if state.trigger.is_shutdown() {
        return Err(ApiError::Unavailable(
            "Polling trigger is stopped".to_string(),
        ));
    }

    tracing::info!("Manual poll requested over HTTP");
    state.trigger.trigger_now();

    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "scheduled" }))))
}
