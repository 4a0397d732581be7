use crate::error::AppError;
use crate::ingest::process_event;
use crate::quo_types::WebhookPayload;
use crate::types::AppState;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, trace};

/// Entry point for every Quo webhook delivery.  All handled and no-op paths
/// answer 200 `{"received": true}`; unparseable payloads and unexpected
/// failures answer 500 `{"error": ...}`.
pub async fn quo_webhook(
    State(app_state): State<Arc<AppState>>,
    body: String,
) -> impl IntoResponse {
    trace!(body = %body, "quo webhook delivery");
    let payload = match serde_json::from_str::<WebhookPayload>(&body) {
        Ok(payload) => payload,
        Err(e) => {
            error!(error = %e, "failed to deserialize quo webhook payload");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("invalid payload: {e}") })),
            );
        }
    };

    match process_event(app_state.store.as_ref(), &payload).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "received": true }))),
        Err(AppError(msg)) => {
            error!(error = %msg, event_type = %payload.event_type, "webhook processing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": msg })),
            )
        }
    }
}

pub async fn health() -> impl IntoResponse {
    "ok"
}
