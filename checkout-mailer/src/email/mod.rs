//! Outbound transactional email.
//!
//! The webhook handler only sees the [`EmailSender`] trait; the concrete
//! Resend client is constructed in `main` and injected through
//! [`crate::web::AppState`].

pub mod resend;
pub mod template;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use resend::ResendClient;
pub use template::ConfirmationTemplate;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email request timed out")]
    Timeout,

    #[error("email request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("email service returned {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// A single email to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Result of a successful send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailReceipt {
    /// Provider-assigned message id
    pub id: String,
}

/// Sends transactional email.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<EmailReceipt, EmailError>;
}
