//! Checkout Mailer - Stripe checkout webhook receiver.
//!
//! Verifies Stripe webhook signatures and, when a checkout session completes
//! with a customer email, sends a purchase confirmation through Resend.
//!
//! ## Flow
//!
//! ```text
//! Stripe → POST /api/stripe-webhook → verify signature → branch on event type → Resend
//! ```

// Handler panics are turned into 500 responses by the catch-panic layer,
// which needs unwinding.
#[cfg(not(panic = "unwind"))]
compile_error!("checkout-mailer must be built with panic = \"unwind\"");

pub mod config;
pub mod email;
pub mod stripe;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use email::{
    ConfirmationTemplate, EmailError, EmailMessage, EmailReceipt, EmailSender, ResendClient,
};
pub use stripe::{StripeEvent, StripeWebhookVerifier};
pub use web::{router, AppState};
