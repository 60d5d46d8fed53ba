//! Magic-link mail delivery adapters.
//!
//! Mail infrastructure is a vendored concern: the HTTP adapter posts to a
//! provider API, and the log adapter prints the link for local
//! development where no provider is configured.

use async_trait::async_trait;
use tracing::info;

use notabene_core::{Error, MailSender, Result};

/// Delivers login links through an HTTP mail provider.
pub struct HttpMailSender {
    client: reqwest::Client,
    api_url: String,
}

impl HttpMailSender {
    /// Create a sender posting to the given provider endpoint.
    pub fn new(api_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
        }
    }
}

#[async_trait]
impl MailSender for HttpMailSender {
    async fn send_login_link(&self, email: &str, link: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.api_url)
            .json(&serde_json::json!({
                "to": email,
                "subject": "Your notabene login link",
                "text": format!(
                    "Follow this link to log in (valid for 15 minutes):\n\n{}",
                    link
                ),
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Mail(format!(
                "mail provider returned {}",
                response.status()
            )));
        }

        info!(
            subsystem = "mail",
            op = "send_login_link",
            email = email,
            "Login link dispatched"
        );
        Ok(())
    }
}

/// Development fallback: logs the link instead of sending it.
pub struct LogMailSender;

#[async_trait]
impl MailSender for LogMailSender {
    async fn send_login_link(&self, email: &str, link: &str) -> Result<()> {
        info!(
            subsystem = "mail",
            op = "send_login_link",
            email = email,
            link = link,
            "MAIL_API_URL not set; login link logged instead of sent"
        );
        Ok(())
    }
}
