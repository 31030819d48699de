//! Stripe webhook endpoint.
//!
//! Each request runs the whole pipeline before answering:
//! 1. Read the body (bounded)
//! 2. Verify the signature
//! 3. Build the notification
//! 4. Forward it to ntfy
//!
//! A failure at step 4 becomes a 500 so Stripe retries the delivery.

use std::sync::Arc;

use axum::{
    body::{self, Body},
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::{error, info, warn};

use crate::notify::build_notification;
use crate::ntfy::{DispatchError, NtfyClient};
use crate::stripe::{EventVerifier, StripeVerifier, VerificationError, SIGNATURE_HEADER};
use crate::web::error::ReceiveError;
use crate::Config;

/// Largest webhook body accepted, in bytes.
pub const MAX_BODY_BYTES: usize = 65536;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub verifier: Arc<dyn EventVerifier>,
    pub ntfy: NtfyClient,
}

impl AppState {
    pub fn new(config: Config, verifier: Arc<dyn EventVerifier>, ntfy: NtfyClient) -> Self {
        Self {
            config: Arc::new(config),
            verifier,
            ntfy,
        }
    }

    /// Wire up the Stripe verifier and ntfy client described by `config`.
    pub fn from_config(config: Config) -> Result<Self, DispatchError> {
        let verifier = Arc::new(StripeVerifier::new(config.signature_tolerance));
        let ntfy = NtfyClient::new(config.ntfy.clone())?;

        Ok(Self::new(config, verifier, ntfy))
    }
}

/// Stripe webhook endpoint.
///
/// Answers 204 once the notification has been accepted by ntfy.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<StatusCode, ReceiveError> {
    let payload = body::to_bytes(body, MAX_BODY_BYTES).await.map_err(|e| {
        error!(error = %e, limit = MAX_BODY_BYTES, "webhook_body_read_failed");
        ReceiveError::BodyTooLarge {
            limit: MAX_BODY_BYTES,
        }
    })?;

    let signature = match headers.get(SIGNATURE_HEADER) {
        Some(value) if !value.is_empty() => value.to_str().map_err(|_| {
            warn!("stripe_signature_not_ascii");
            ReceiveError::VerificationFailed(VerificationError::MalformedHeader)
        })?,
        _ => {
            warn!(body_length = payload.len(), "stripe_signature_missing");
            return Err(ReceiveError::MissingSignature);
        }
    };

    let event = state
        .verifier
        .verify(&payload, signature, &state.config.stripe_webhook_secret)
        .map_err(|e| {
            warn!(error = %e, body_length = payload.len(), "stripe_signature_invalid");
            e
        })?;

    info!(
        event_type = %event.event_type,
        live_mode = event.live_mode,
        "stripe_event_received"
    );

    let notification = build_notification(&event.event_type, &event.raw_data);

    if let Err(e) = state.ntfy.dispatch(event.live_mode, &notification).await {
        error!(
            event_type = %event.event_type,
            error = %e,
            "ntfy_forward_failed"
        );
        return Err(e.into());
    }

    info!(event_type = %event.event_type, "stripe_event_forwarded");

    Ok(StatusCode::NO_CONTENT)
}
