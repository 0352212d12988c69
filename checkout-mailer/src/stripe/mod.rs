//! Stripe webhook support: signature verification and event payloads.

pub mod event;
pub mod signature;

pub use event::{CheckoutSession, CustomerDetails, EventType, StripeEvent};
pub use signature::{
    compute_signature, sign_payload, SignatureError, SignatureHeader, StripeWebhookVerifier,
    SIGNATURE_HEADER,
};
