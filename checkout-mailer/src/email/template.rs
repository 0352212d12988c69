//! Purchase confirmation email.

use url::Url;

use super::EmailMessage;
use crate::Config;

/// Fixed sender, subject and link prefix for the confirmation email.
#[derive(Debug, Clone)]
pub struct ConfirmationTemplate {
    pub from: String,
    pub subject: String,
    pub access_url_base: Url,
}

impl ConfirmationTemplate {
    pub fn from_config(config: &Config) -> Self {
        Self {
            from: config.email_from.clone(),
            subject: config.email_subject.clone(),
            access_url_base: config.access_url_base.clone(),
        }
    }

    /// Link the buyer follows to reach their purchase.
    pub fn access_link(&self, session_id: &str) -> String {
        match self.access_url_base.join(session_id) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}{}", self.access_url_base, session_id),
        }
    }

    /// Build the email for a completed checkout session.
    pub fn render(&self, to: &str, session_id: &str) -> EmailMessage {
        let link = self.access_link(session_id);

        let html = format!(
            r#"
<h1>Obrigado pela compra!</h1>
<p>Seu acesso está pronto. Clique no botão abaixo:</p>
<a href="{link}" style="padding:12px 24px;background:#6366f1;color:#fff;text-decoration:none;border-radius:6px;">Acessar agora</a>
"#
        );

        EmailMessage {
            from: self.from.clone(),
            to: to.to_string(),
            subject: self.subject.clone(),
            html,
        }
    }
}
