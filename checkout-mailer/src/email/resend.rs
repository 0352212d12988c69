//! Resend API client.
//!
//! Reference: https://resend.com/docs/api-reference/emails/send-email

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use url::Url;

use super::{EmailError, EmailMessage, EmailReceipt, EmailSender};

/// Request body for `POST /emails`.
#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

/// Error body returned by Resend on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Resend email sender.
#[derive(Clone)]
pub struct ResendClient {
    client: Client,
    api_key: String,
    endpoint: Url,
    timeout: Duration,
}

impl ResendClient {
    /// Create a client for the API at `base_url` (normally `https://api.resend.com`).
    pub fn new(
        client: Client,
        api_key: impl Into<String>,
        base_url: &Url,
        timeout: Duration,
    ) -> Self {
        let mut endpoint = base_url.clone();
        endpoint.set_path(&format!("{}/emails", base_url.path().trim_end_matches('/')));

        Self {
            client,
            api_key: api_key.into(),
            endpoint,
            timeout,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl EmailSender for ResendClient {
    async fn send(&self, message: &EmailMessage) -> Result<EmailReceipt, EmailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            html_length = message.html.len(),
            "resend_send_starting"
        );

        let body = SendEmailRequest {
            from: &message.from,
            to: [message.to.as_str()],
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!(
                        timeout_seconds = self.timeout.as_secs_f64(),
                        error = %e,
                        "resend_send_timeout"
                    );
                    EmailError::Timeout
                } else {
                    error!(error = %e, "resend_send_request_error");
                    EmailError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorResponse>(&text) {
                Ok(ErrorResponse {
                    message: Some(m), ..
                }) => m,
                Ok(ErrorResponse { name: Some(n), .. }) => n,
                _ => text.chars().take(200).collect(),
            };

            error!(
                status_code = status.as_u16(),
                message = %message,
                "resend_send_rejected"
            );

            return Err(EmailError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: SendEmailResponse = response.json().await?;

        info!(email_id = %parsed.id, to = %message.to, "resend_send_complete");

        Ok(EmailReceipt { id: parsed.id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message() -> EmailMessage {
        EmailMessage {
            from: "Seu App <noreply@seudominio.com>".to_string(),
            to: "buyer@example.com".to_string(),
            subject: "Compra confirmada!".to_string(),
            html: "<h1>Obrigado</h1>".to_string(),
        }
    }

    fn client_for(server: &MockServer, timeout: Duration) -> ResendClient {
        let base = Url::parse(&server.uri()).unwrap();
        ResendClient::new(Client::new(), "re_test_key", &base, timeout)
    }

    #[test]
    fn test_endpoint_path() {
        let base = Url::parse("https://api.resend.com").unwrap();
        let client = ResendClient::new(Client::new(), "re_x", &base, Duration::from_secs(1));
        assert_eq!(client.endpoint().as_str(), "https://api.resend.com/emails");

        let base = Url::parse("http://localhost:9000/proxy/").unwrap();
        let client = ResendClient::new(Client::new(), "re_x", &base, Duration::from_secs(1));
        assert_eq!(client.endpoint().as_str(), "http://localhost:9000/proxy/emails");
    }

    #[tokio::test]
    async fn test_send_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer re_test_key"))
            .and(body_json(json!({
                "from": "Seu App <noreply@seudominio.com>",
                "to": ["buyer@example.com"],
                "subject": "Compra confirmada!",
                "html": "<h1>Obrigado</h1>"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "email_123" })))
            .expect(1)
            .mount(&server)
            .await;

        let receipt = client_for(&server, Duration::from_secs(5))
            .send(&message())
            .await
            .unwrap();

        assert_eq!(receipt.id, "email_123");
    }

    #[tokio::test]
    async fn test_send_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/emails"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "statusCode": 422,
                "name": "validation_error",
                "message": "Invalid `to` field."
            })))
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_secs(5))
            .send(&message())
            .await
            .unwrap_err();

        match err {
            EmailError::Rejected { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Invalid `to` field.");
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_server_error_plain_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_secs(5))
            .send(&message())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EmailError::Rejected { status: 503, ref message } if message == "upstream unavailable"
        ));
    }

    #[tokio::test]
    async fn test_send_timeout() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "id": "late" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_millis(100))
            .send(&message())
            .await
            .unwrap_err();

        assert!(matches!(err, EmailError::Timeout));
    }
}
