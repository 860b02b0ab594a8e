//! Confirmation emails sent through the Mailgun HTTP API

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::models::User;
use crate::templates::Templates;

const CONFIRMATION_SUBJECT: &str = "Confirm your movie catalog account";

/// Mailgun configuration
#[derive(Debug, Clone)]
pub struct MailgunConfig {
    /// Private API key, sent as the basic auth password of user `api`
    pub api_key: String,
    /// Sending domain
    pub domain: String,
    /// API base URL without trailing slash
    pub api_base: String,
    /// `From` header
    pub sender: String,
    /// Request timeout in seconds
    pub timeout: u64,
}

impl MailgunConfig {
    /// Create a new MailgunConfig from environment variables
    ///
    /// # Environment Variables
    /// - `EMAIL_API_KEY`: Mailgun API key (required)
    /// - `MAILGUN_DOMAIN`: Sending domain (required)
    /// - `MAILGUN_API_BASE`: API base URL (default: "https://api.mailgun.net/v3")
    /// - `MAILGUN_SENDER`: From header (default: "no-reply <postmaster@DOMAIN>")
    /// - `EMAIL_TIMEOUT_SECS`: Request timeout in seconds (default: 10)
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("EMAIL_API_KEY")
            .map_err(|_| anyhow::anyhow!("EMAIL_API_KEY environment variable not set"))?;

        let domain = std::env::var("MAILGUN_DOMAIN")
            .map_err(|_| anyhow::anyhow!("MAILGUN_DOMAIN environment variable not set"))?;

        let api_base = std::env::var("MAILGUN_API_BASE")
            .unwrap_or_else(|_| "https://api.mailgun.net/v3".to_string())
            .trim_end_matches('/')
            .to_string();

        let sender = std::env::var("MAILGUN_SENDER")
            .unwrap_or_else(|_| format!("no-reply <postmaster@{}>", domain));

        let timeout = std::env::var("EMAIL_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        Ok(MailgunConfig {
            api_key,
            domain,
            api_base,
            sender,
            timeout,
        })
    }
}

/// Email dispatch failure
#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Email request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Email provider answered {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Failed to render email: {0}")]
    Template(#[from] tera::Error),
}

/// Sends the account confirmation link
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfirmationMailer: Send + Sync {
    async fn send_confirmation(&self, user: &User) -> Result<(), EmailError>;
}

/// Mailgun client
#[derive(Clone)]
pub struct MailgunMailer {
    client: Client,
    config: MailgunConfig,
    templates: Templates,
    public_url: String,
}

impl MailgunMailer {
    /// `public_url` is the externally reachable base of this service, used
    /// to build the confirmation link.
    pub fn new(
        config: MailgunConfig,
        templates: Templates,
        public_url: &str,
    ) -> Result<Self, EmailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            config,
            templates,
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }

    fn confirmation_link(&self, user_id: i64) -> String {
        format!("{}/confirm/{}", self.public_url, user_id)
    }
}

#[async_trait]
impl ConfirmationMailer for MailgunMailer {
    async fn send_confirmation(&self, user: &User) -> Result<(), EmailError> {
        let link = self.confirmation_link(user.id);
        let html = self.templates.activation_email(&user.login, &link)?;
        let to = format!("<{}>", user.email);

        let url = format!("{}/{}/messages", self.config.api_base, self.config.domain);
        let response = self
            .client
            .post(&url)
            .basic_auth("api", Some(&self.config.api_key))
            .form(&[
                ("from", self.config.sender.as_str()),
                ("to", to.as_str()),
                ("subject", CONFIRMATION_SUBJECT),
                ("html", html.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!("Confirmation email sent to user {}", user.id);
        Ok(())
    }
}
