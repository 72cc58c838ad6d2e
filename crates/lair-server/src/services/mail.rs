//! Outbound mail.

use async_trait::async_trait;
use lair_app::ContactMessage;
use serde::Serialize;
use tracing::info;

use super::{Mailer, ServiceError};

/// Posts messages as JSON to a mail relay endpoint.
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
}

/// JSON body sent to the relay.
#[derive(Debug, Serialize)]
struct MailRequest<'a> {
    from_name: &'a str,
    reply_to: &'a str,
    subject: String,
    body: &'a str,
}

impl HttpMailer {
    /// Mailer posting to `endpoint`.
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self { client, endpoint: endpoint.into() }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &ContactMessage) -> Result<(), ServiceError> {
        let request = MailRequest {
            from_name: &message.name,
            reply_to: &message.email,
            subject: format!("Message from {}", message.name),
            body: &message.message,
        };
        self.client.post(&self.endpoint).json(&request).send().await?.error_for_status()?;
        info!(from = %message.email, "message relayed");
        Ok(())
    }
}

/// Logs messages and reports success. Used when no relay is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &ContactMessage) -> Result<(), ServiceError> {
        info!(
            from = %message.name,
            reply_to = %message.email,
            chars = message.message.chars().count(),
            "contact message received"
        );
        Ok(())
    }
}
