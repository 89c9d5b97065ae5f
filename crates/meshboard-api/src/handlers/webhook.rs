//! Inbound webhook receiver.
//!
//! Accepts the raw request body so the HMAC verification inside the
//! gateway covers the exact bytes that were sent.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::error::ApiError;

use crate::state::AppState;

/// Signature may also arrive as a query parameter for senders that
/// cannot set custom headers.
#[derive(Debug, Deserialize)]
pub struct WebhookQuery {
    /// Hex HMAC-SHA256 of the body, optionally `sha256=`-prefixed.
    pub sig: Option<String>,
}

/// POST /api/webhook
pub async fn receive(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let header_sig = headers
        .get("x-webhook-signature")
        .and_then(|v| v.to_str().ok());
    let supplied = header_sig.or(query.sig.as_deref());

    let event = state.gateway.process(&body, supplied).await?;
    let report = state.registry.handle_webhook(&event).await;

    info!(event = %event.event_type, "Webhook event dispatched");

    // Flat body: `eventType` and `results` sit next to the success flag.
    let mut response = serde_json::to_value(&report)?;
    response["success"] = Value::Bool(true);
    Ok(Json(response))
}
