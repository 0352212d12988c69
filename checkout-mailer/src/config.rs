//! Configuration module for environment variable parsing.
//!
//! All configuration is read once at startup. The three provider secrets are
//! required; every other setting falls back to a default.

use std::env;
use std::fmt;

use thiserror::Error;
use tracing::warn;
use url::Url;

/// Stripe API version the original integration was pinned to.
pub const DEFAULT_STRIPE_API_VERSION: &str = "2024-04-10";

const DEFAULT_EMAIL_FROM: &str = "Seu App <noreply@seudominio.com>";
const DEFAULT_EMAIL_SUBJECT: &str = "Compra confirmada!";
const DEFAULT_ACCESS_URL_BASE: &str = "https://seudominio.com/acesso/";
const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingRequired(&'static str),

    #[error("{name} is not a valid URL: {reason}")]
    InvalidUrl { name: &'static str, reason: String },

    #[error("STRIPE_SECRET_KEY must start with sk_ or rk_")]
    InvalidStripeKey,
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Stripe API secret key. Only validated at startup; the webhook path
    /// never calls the Stripe API.
    pub stripe_secret_key: String,

    /// Stripe API version pinned for this integration
    pub stripe_api_version: String,

    /// Stripe webhook signing secret (`whsec_...`)
    pub stripe_webhook_secret: String,

    /// Maximum age in seconds for Stripe signature timestamps (0 disables)
    pub stripe_signature_max_age: u64,

    /// Resend API key
    pub resend_api_key: String,

    /// Resend API base URL
    pub resend_api_url: Url,

    /// Sender for confirmation emails, e.g. `Name <addr@domain>`
    pub email_from: String,

    /// Subject line for confirmation emails
    pub email_subject: String,

    /// Prefix the checkout session id is appended to in the access link
    pub access_url_base: Url,

    /// Timeout for the outbound email call in milliseconds
    pub email_timeout_ms: u64,

    /// Timeout for reading the inbound request body in milliseconds
    pub body_read_timeout_ms: u64,

    /// Maximum accepted webhook body size in bytes
    pub max_body_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let stripe_secret_key = required("STRIPE_SECRET_KEY")?;
        if !(stripe_secret_key.starts_with("sk_") || stripe_secret_key.starts_with("rk_")) {
            return Err(ConfigError::InvalidStripeKey);
        }

        Ok(Config {
            port: parse_or("PORT", 8080),

            stripe_secret_key,

            stripe_api_version: env::var("STRIPE_API_VERSION")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_STRIPE_API_VERSION.to_string()),

            stripe_webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,

            stripe_signature_max_age: parse_or("STRIPE_SIGNATURE_MAX_AGE", 300), // 5 minutes

            resend_api_key: required("RESEND_API_KEY")?,

            resend_api_url: parse_url("RESEND_API_URL", DEFAULT_RESEND_API_URL, false)?,

            email_from: string_or("EMAIL_FROM", DEFAULT_EMAIL_FROM),

            email_subject: string_or("EMAIL_SUBJECT", DEFAULT_EMAIL_SUBJECT),

            access_url_base: parse_url("ACCESS_URL_BASE", DEFAULT_ACCESS_URL_BASE, true)?,

            email_timeout_ms: parse_or("EMAIL_TIMEOUT_MS", 8000),

            body_read_timeout_ms: parse_or("BODY_READ_TIMEOUT_MS", 5000),

            max_body_bytes: parse_or("MAX_BODY_BYTES", 256 * 1024),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("stripe_secret_key", &"[redacted]")
            .field("stripe_api_version", &self.stripe_api_version)
            .field("stripe_webhook_secret", &"[redacted]")
            .field("stripe_signature_max_age", &self.stripe_signature_max_age)
            .field("resend_api_key", &"[redacted]")
            .field("resend_api_url", &self.resend_api_url.as_str())
            .field("email_from", &self.email_from)
            .field("email_subject", &self.email_subject)
            .field("access_url_base", &self.access_url_base.as_str())
            .field("email_timeout_ms", &self.email_timeout_ms)
            .field("body_read_timeout_ms", &self.body_read_timeout_ms)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

/// Read a required, non-blank variable.
fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingRequired(name))
}

fn string_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parse a numeric variable, falling back to the default when unset or invalid.
fn parse_or<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse::<T>() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

/// Parse a URL variable. With `directory` set, a trailing slash is enforced so
/// that joining a path segment appends instead of replacing the last one.
fn parse_url(name: &'static str, default: &str, directory: bool) -> Result<Url, ConfigError> {
    let mut raw = string_or(name, default);
    if directory && !raw.ends_with('/') {
        raw.push('/');
    }

    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl {
        name,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_valid() {
        env::set_var("TEST_CFG_PARSE_VALID", "1234");
        let result: u64 = parse_or("TEST_CFG_PARSE_VALID", 10);
        assert_eq!(result, 1234);
        env::remove_var("TEST_CFG_PARSE_VALID");
    }

    #[test]
    fn test_parse_or_invalid_uses_default() {
        env::set_var("TEST_CFG_PARSE_INVALID", "not-a-number");
        let result: u16 = parse_or("TEST_CFG_PARSE_INVALID", 8080);
        assert_eq!(result, 8080);
        env::remove_var("TEST_CFG_PARSE_INVALID");
    }

    #[test]
    fn test_parse_or_default() {
        let result: usize = parse_or("TEST_CFG_NONEXISTENT", 42);
        assert_eq!(result, 42);
    }

    #[test]
    fn test_required_rejects_blank() {
        env::set_var("TEST_CFG_BLANK", "   ");
        assert!(matches!(
            required("TEST_CFG_BLANK"),
            Err(ConfigError::MissingRequired("TEST_CFG_BLANK"))
        ));
        env::remove_var("TEST_CFG_BLANK");
        assert!(required("TEST_CFG_BLANK").is_err());
    }

    #[test]
    fn test_parse_url_adds_trailing_slash() {
        env::set_var("TEST_CFG_URL", "https://example.com/access");
        let url = parse_url("TEST_CFG_URL", DEFAULT_ACCESS_URL_BASE, true).unwrap();
        assert_eq!(url.as_str(), "https://example.com/access/");
        env::remove_var("TEST_CFG_URL");
    }

    #[test]
    fn test_parse_url_invalid() {
        env::set_var("TEST_CFG_BAD_URL", "not a url");
        let result = parse_url("TEST_CFG_BAD_URL", DEFAULT_RESEND_API_URL, false);
        assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
        env::remove_var("TEST_CFG_BAD_URL");
    }

    #[test]
    fn test_parse_url_default() {
        let url = parse_url("TEST_CFG_URL_UNSET", DEFAULT_ACCESS_URL_BASE, true).unwrap();
        assert_eq!(url.as_str(), "https://seudominio.com/acesso/");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config {
            port: 8080,
            stripe_secret_key: "sk_test_secret".to_string(),
            stripe_api_version: DEFAULT_STRIPE_API_VERSION.to_string(),
            stripe_webhook_secret: "whsec_secret".to_string(),
            stripe_signature_max_age: 300,
            resend_api_key: "re_secret".to_string(),
            resend_api_url: Url::parse(DEFAULT_RESEND_API_URL).unwrap(),
            email_from: DEFAULT_EMAIL_FROM.to_string(),
            email_subject: DEFAULT_EMAIL_SUBJECT.to_string(),
            access_url_base: Url::parse(DEFAULT_ACCESS_URL_BASE).unwrap(),
            email_timeout_ms: 8000,
            body_read_timeout_ms: 5000,
            max_body_bytes: 1024,
        };

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk_test_secret"));
        assert!(!rendered.contains("whsec_secret"));
        assert!(!rendered.contains("re_secret"));
        assert!(rendered.contains("[redacted]"));
    }
}
