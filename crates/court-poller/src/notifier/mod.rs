//! Outbound notification channels.
//!
//! Exactly one channel is active per deployment, chosen from the config at
//! startup. Delivery is best-effort: callers log failures and move on.

mod chat;
mod email;
pub mod message;

use async_trait::async_trait;
use std::time::Duration;

use crate::config::NotifierConfig;

pub use chat::ChatNotifier;
pub use email::EmailNotifier;
pub use message::SlotDigest;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("relay returned {0}")]
    Status(reqwest::StatusCode),

    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Template rendering failed: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub subject: String,
    /// Plain text body; what chat channels deliver.
    pub text: String,
    /// HTML body for email; falls back to `text` when absent.
    pub html: Option<String>,
}

impl Notification {
    pub fn plain(subject: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            text: text.into(),
            html: None,
        }
    }

    /// Sent once when the monitor starts.
    pub fn startup() -> Self {
        Self::plain(
            "Court Monitor Online",
            "🤖 Padel Monitor Started! I will message you when courts open.",
        )
    }

    /// Sent by the `test-notify` command.
    pub fn test() -> Self {
        Self::plain(
            "[TEST] Court Monitor",
            "This is a test notification from the court monitor.",
        )
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Short channel name for logs (e.g. "email", "chat").
    fn channel_name(&self) -> &str;
}

/// Build the configured channel.
pub fn from_config(config: &NotifierConfig, timeout: Duration) -> Result<Box<dyn Notifier>, NotifyError> {
    match config {
        NotifierConfig::Email(email) => Ok(Box::new(EmailNotifier::from_config(email, timeout)?)),
        NotifierConfig::Chat(chat) => Ok(Box::new(ChatNotifier::from_config(chat, timeout)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChatConfig, EmailConfig, TlsMode};

    #[test]
    fn test_from_config_picks_channel() {
        let chat = NotifierConfig::Chat(ChatConfig {
            recipient: "4915100000000".to_string(),
            api_key: "key".to_string(),
            relay_url: "https://relay.example.com/send".to_string(),
        });
        let notifier = from_config(&chat, Duration::from_secs(5)).unwrap();
        assert_eq!(notifier.channel_name(), "chat");

        let email = NotifierConfig::Email(EmailConfig {
            from: "monitor@example.com".to_string(),
            password: "pw".to_string(),
            to: "me@example.com".to_string(),
            smtp_server: "smtp.example.com".to_string(),
            smtp_port: 587,
            tls: TlsMode::Starttls,
        });
        let notifier = from_config(&email, Duration::from_secs(5)).unwrap();
        assert_eq!(notifier.channel_name(), "email");
    }

    #[test]
    fn test_builtin_messages_are_plain() {
        assert!(Notification::startup().html.is_none());
        assert!(Notification::test().subject.starts_with("[TEST]"));
    }
}
