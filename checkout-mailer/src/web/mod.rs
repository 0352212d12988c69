//! Web server module for the Stripe checkout webhook.
//!
//! This module provides the router and handlers that:
//! - Receive the raw webhook body from Stripe
//! - Verify the signature before trusting anything in it
//! - Send the purchase confirmation email on `checkout.session.completed`
//! - Acknowledge with `{"received": true}`

pub mod error;
pub mod handlers;

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::error;

pub use error::{WebhookError, FAILED_BODY, REJECTED_BODY};
pub use handlers::{health, stripe_webhook, AppState, HealthResponse, Outcome, WebhookResponse};

/// Path Stripe is configured to deliver events to.
pub const STRIPE_WEBHOOK_PATH: &str = "/api/stripe-webhook";

/// Build the application router.
///
/// Panics inside a handler become a 500 instead of dropping the connection.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(STRIPE_WEBHOOK_PATH, post(stripe_webhook))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    error!(panic = %detail, "handler_panicked");

    (StatusCode::INTERNAL_SERVER_ERROR, FAILED_BODY).into_response()
}
