use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::MailConfig;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Email API request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Email API rejected the message: {status}")]
    Rejected { status: reqwest::StatusCode },
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError>;
}

/// Delivers mail through a Postmark-style HTTP API.
pub struct HttpMailer {
    http: reqwest::Client,
    base_url: String,
    from: String,
    server_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text_body: &'a str,
}

impl HttpMailer {
    pub fn new(mail: &MailConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            base_url: mail.api_base_url.trim_end_matches('/').to_string(),
            from: mail.from_address.clone(),
            server_token: mail.server_token.clone(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        let url = format!("{}/email", self.base_url);
        let request = SendEmailRequest {
            from: &self.from,
            to,
            subject,
            text_body: body,
        };

        let response = self
            .http
            .post(&url)
            .header("X-Postmark-Server-Token", &self.server_token)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MailerError::Rejected {
                status: response.status(),
            });
        }

        Ok(())
    }
}

/// Stand-in used when mail delivery is disabled. Messages land in the log
/// at debug level and nothing leaves the process.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        debug!(to, subject, body, "Mail delivery disabled, dropping email");
        Ok(())
    }
}
