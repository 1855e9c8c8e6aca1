//! Provider notification endpoint

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, warn};

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::error::Error;
use crate::webhook::{WebhookQuery, WebhookRequest};

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Receive a payment notification.
///
/// Anything but `POST` is acknowledged without work. Processing failures
/// answer `400 Error` so the provider retries.
pub async fn payment_notification(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    query: Option<Query<WebhookQuery>>,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return (StatusCode::OK, "Ok").into_response();
    }

    let request = WebhookRequest {
        signature: header(&headers, "x-signature"),
        request_id: header(&headers, "x-request-id"),
        query: query.map(|Query(q)| q).unwrap_or_default(),
        body: body.to_vec(),
    };

    match state.webhooks.handle(&request).await {
        Ok(outcome) => {
            debug!("Notification handled: {outcome:?}");
            (StatusCode::OK, Json(json!({ "received": true }))).into_response()
        }
        Err(e @ Error::Signature(_)) => ApiError::from(e).into_response(),
        Err(e) => {
            warn!("Notification processing failed: {e}");
            (StatusCode::BAD_REQUEST, "Error").into_response()
        }
    }
}
