//! Webhook failure taxonomy and its HTTP mapping.
//!
//! The payment provider only ever sees a status code and a generic body;
//! details go to the server log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::email::EmailError;
use crate::stripe::SignatureError;

/// Body returned for rejected (unverified) requests.
pub const REJECTED_BODY: &str = "Webhook Error";

/// Body returned when a verified request could not be processed.
pub const FAILED_BODY: &str = "Webhook handler failed";

#[derive(Debug, Error)]
pub enum WebhookError {
    /// The request body could not be read (client abort, over size limit).
    #[error("failed to read request body: {0}")]
    BodyUnreadable(String),

    /// Reading the request body did not finish in time.
    #[error("timed out reading request body")]
    BodyTimeout,

    #[error("signature verification failed: {0}")]
    Signature(#[from] SignatureError),

    /// Verified body that is not a well-formed event.
    #[error("invalid event payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("failed to send confirmation email: {0}")]
    Email(#[from] EmailError),
}

impl WebhookError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::BodyUnreadable(_) | WebhookError::Signature(_) => StatusCode::BAD_REQUEST,
            WebhookError::BodyTimeout | WebhookError::Payload(_) | WebhookError::Email(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// True when the request was rejected before anything was trusted.
    pub fn is_rejection(&self) -> bool {
        self.status() == StatusCode::BAD_REQUEST
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let body = if self.is_rejection() {
            REJECTED_BODY
        } else {
            FAILED_BODY
        };

        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_errors_are_rejections() {
        let errors = [
            SignatureError::MissingHeader,
            SignatureError::Malformed("x"),
            SignatureError::NoSignatures,
            SignatureError::Mismatch,
            SignatureError::Stale {
                age_seconds: 900,
                max_age_seconds: 300,
            },
        ];

        for err in errors {
            let err = WebhookError::from(err);
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            assert!(err.is_rejection());
        }
    }

    #[test]
    fn test_post_verification_errors_are_failures() {
        let payload = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(
            WebhookError::from(payload).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            WebhookError::from(EmailError::Timeout).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            WebhookError::BodyTimeout.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_body_unreadable_is_rejection() {
        let err = WebhookError::BodyUnreadable("length limit exceeded".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_into_response() {
        let response = WebhookError::from(SignatureError::Mismatch).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = WebhookError::from(EmailError::Timeout).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
