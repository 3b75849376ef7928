//! Webhook endpoint handler.
//!
//! Verifies the signature, parses the delivery and runs the matching handler
//! before responding. There is no queue: GitHub sees the handler's result.

use std::error::Error as StdError;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::AppState;
use crate::effects::GitHubInterpreter;
use crate::gateway::GatewayError;
use crate::types::DeliveryId;
use crate::webhooks::{
    DELIVERY_HEADER, EVENT_HEADER, HandlerOutcome, ParseError, SIGNATURE_HEADER, handle_event,
    parse_webhook, verify_signature,
};

/// Errors that can occur when processing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing required header.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// The signature did not verify against the configured secret.
    #[error("invalid signature")]
    InvalidSignature,

    /// The payload could not be parsed.
    #[error("malformed payload: {0}")]
    Malformed(#[from] ParseError),

    /// A GitHub call made by the handler failed.
    #[error("GitHub call failed: {0}")]
    Gateway(#[from] GatewayError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingHeader(_) | WebhookError::Malformed(_) => StatusCode::BAD_REQUEST,
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}

/// Webhook handler.
///
/// - 200 `OK`: delivery handled
/// - 200 `Ignored`: event type or action the bot does not act on
/// - 400: missing header or malformed payload
/// - 401: invalid signature (nothing else is done)
/// - 500: a GitHub call failed part-way; earlier effects stay applied
pub async fn webhook_handler<I>(
    State(app_state): State<AppState<I>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError>
where
    I: GitHubInterpreter + Send + Sync + 'static,
    I::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let event_type = get_header(&headers, EVENT_HEADER)?;
    let signature_header = get_header(&headers, SIGNATURE_HEADER)?;
    let delivery_id = DeliveryId::new(
        headers
            .get(DELIVERY_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-"),
    );

    debug!(delivery_id = %delivery_id, event_type = %event_type, "Received webhook");

    // Verify signature BEFORE any parsing or GitHub call.
    if !verify_signature(&body, &signature_header, app_state.webhook_secret()) {
        warn!(delivery_id = %delivery_id, "Invalid webhook signature");
        return Err(WebhookError::InvalidSignature);
    }

    let Some(event) = parse_webhook(&event_type, &body)? else {
        debug!(delivery_id = %delivery_id, event_type = %event_type, "Ignoring event");
        return Ok((StatusCode::OK, "Ignored"));
    };

    let pr = event.pr_number();
    let kind = event.kind();

    match handle_event(app_state.gateway(), app_state.config(), event, Utc::now()).await {
        Ok(HandlerOutcome::Ignored(reason)) => {
            debug!(delivery_id = %delivery_id, pr = %pr, event = kind, reason, "Nothing to do");
            Ok((StatusCode::OK, "Ignored"))
        }
        Ok(outcome) => {
            info!(delivery_id = %delivery_id, pr = %pr, event = kind, ?outcome, "Webhook handled");
            Ok((StatusCode::OK, "OK"))
        }
        Err(e) => {
            error!(delivery_id = %delivery_id, pr = %pr, event = kind, error = %e, "Webhook handler failed");
            Err(e.into())
        }
    }
}

/// Extracts a required header value as a string.
fn get_header(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or(WebhookError::MissingHeader(name))
}
