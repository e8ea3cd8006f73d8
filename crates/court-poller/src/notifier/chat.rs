//! Chat delivery through an HTTP relay (CallMeBot's WhatsApp gateway by default).
//!
//! The relay takes everything in the query string:
//! `GET {relay_url}?phone=..&text=..&apikey=..`. Parameters already present
//! on `relay_url` are kept.

use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;

use super::{Notification, Notifier, NotifyError};
use crate::config::ChatConfig;

#[derive(Debug)]
pub struct ChatNotifier {
    client: reqwest::Client,
    relay_url: Url,
    recipient: String,
    api_key: String,
}

impl ChatNotifier {
    pub fn from_config(config: &ChatConfig, timeout: Duration) -> Result<Self, NotifyError> {
        if config.recipient.trim().is_empty() {
            return Err(NotifyError::Config("chat recipient must not be empty".to_string()));
        }

        let relay_url = Url::parse(&config.relay_url)
            .map_err(|e| NotifyError::Config(format!("invalid relay_url {:?}: {}", config.relay_url, e)))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            relay_url,
            recipient: config.recipient.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn request_url(&self, text: &str) -> Url {
        let mut url = self.relay_url.clone();
        url.query_pairs_mut()
            .append_pair("phone", &self.recipient)
            .append_pair("text", text)
            .append_pair("apikey", &self.api_key);
        url
    }
}

#[async_trait]
impl Notifier for ChatNotifier {
    /// Chat has no subject line; only the plain text body is sent.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self.client.get(self.request_url(&notification.text)).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(channel = "chat", %status, "relay rejected message");
            return Err(NotifyError::Status(status));
        }

        tracing::info!(channel = "chat", recipient = %self.recipient, "notification delivered");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "chat"
    }
}
