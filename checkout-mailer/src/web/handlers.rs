//! Webhook endpoint handlers.
//!
//! The Stripe handler runs the whole callback inline:
//! 1. Buffer the raw body (bounded by size and time)
//! 2. Verify the `Stripe-Signature` header against those exact bytes
//! 3. Parse the event and branch on its type
//! 4. Send at most one confirmation email
//!
//! The body is taken as an untyped [`Body`] so no extractor or layer can
//! parse or rewrite it before verification.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::email::{ConfirmationTemplate, EmailSender};
use crate::stripe::{EventType, StripeEvent, StripeWebhookVerifier, SIGNATURE_HEADER};
use crate::web::error::WebhookError;
use crate::Config;

/// Shared application state.
///
/// Every collaborator is constructed by the caller and injected here, so
/// tests can swap the email sender for a fake.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<StripeWebhookVerifier>,
    pub mailer: Arc<dyn EmailSender>,
    pub template: Arc<ConfirmationTemplate>,
    pub max_body_bytes: usize,
    pub body_read_timeout: Duration,
}

impl AppState {
    pub fn new(config: &Config, mailer: Arc<dyn EmailSender>) -> Self {
        Self {
            verifier: Arc::new(StripeWebhookVerifier::new(
                config.stripe_webhook_secret.clone(),
                config.stripe_signature_max_age,
            )),
            mailer,
            template: Arc::new(ConfirmationTemplate::from_config(config)),
            max_body_bytes: config.max_body_bytes,
            body_read_timeout: Duration::from_millis(config.body_read_timeout_ms),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Stripe Webhook
// =============================================================================

/// Acknowledgement returned to Stripe.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub received: bool,
}

/// What the handler did with a verified event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    EmailSent,
    EmailSkipped,
    Ignored,
}

/// Stripe webhook endpoint.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> impl IntoResponse {
    match handle_stripe_webhook(&state, &headers, body).await {
        Ok(_) => (StatusCode::OK, Json(WebhookResponse { received: true })).into_response(),
        Err(e) if e.is_rejection() => {
            warn!(error = %e, "stripe_webhook_rejected");
            e.into_response()
        }
        Err(e) => {
            error!(error = %e, "stripe_webhook_failed");
            e.into_response()
        }
    }
}

async fn handle_stripe_webhook(
    state: &AppState,
    headers: &HeaderMap,
    body: Body,
) -> Result<Outcome, WebhookError> {
    let payload = read_raw_body(body, state.max_body_bytes, state.body_read_timeout).await?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    info!(
        body_length = payload.len(),
        has_signature = !signature.is_empty(),
        "stripe_webhook_received"
    );

    state.verifier.verify(&payload, signature)?;

    let event = StripeEvent::from_slice(&payload)?;

    info!(
        event_id = %event.id,
        event_type = ?event.event_type,
        livemode = event.livemode,
        created = ?event.created,
        "stripe_webhook_verified"
    );

    let outcome = dispatch_event(state, &event).await?;

    info!(event_id = %event.id, outcome = ?outcome, "stripe_webhook_handled");

    Ok(outcome)
}

async fn dispatch_event(state: &AppState, event: &StripeEvent) -> Result<Outcome, WebhookError> {
    match event.event_type {
        EventType::CheckoutSessionCompleted => {
            let session = event.checkout_session()?;

            let Some(email) = session.customer_email() else {
                info!(
                    event_id = %event.id,
                    session_id = %session.id,
                    "checkout_email_skipped_no_address"
                );
                return Ok(Outcome::EmailSkipped);
            };

            let message = state.template.render(email, &session.id);
            let receipt = state.mailer.send(&message).await?;

            info!(
                event_id = %event.id,
                session_id = %session.id,
                email_id = %receipt.id,
                "checkout_email_sent"
            );

            Ok(Outcome::EmailSent)
        }
        EventType::CheckoutSessionExpired
        | EventType::PaymentIntentSucceeded
        | EventType::PaymentIntentFailed
        | EventType::Unknown => {
            info!(event_id = %event.id, event_type = ?event.event_type, "stripe_event_ignored");
            Ok(Outcome::Ignored)
        }
    }
}

/// Buffer the request body exactly as received.
async fn read_raw_body(
    body: Body,
    limit: usize,
    timeout: Duration,
) -> Result<Bytes, WebhookError> {
    match tokio::time::timeout(timeout, axum::body::to_bytes(body, limit)).await {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(e)) => Err(WebhookError::BodyUnreadable(e.to_string())),
        Err(_) => Err(WebhookError::BodyTimeout),
    }
}
