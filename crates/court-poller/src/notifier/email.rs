//! SMTP delivery via `lettre`.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;

use super::{Notification, Notifier, NotifyError};
use crate::config::{EmailConfig, TlsMode};

#[derive(Debug)]
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    /// Build the transport. Nothing is sent and no connection is opened here.
    ///
    /// The sender address doubles as the SMTP username; an empty password
    /// means an unauthenticated relay.
    pub fn from_config(config: &EmailConfig, timeout: Duration) -> Result<Self, NotifyError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(format!("invalid sender: {e}")))?;
        let to: Mailbox = config
            .to
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(format!("invalid recipient: {e}")))?;

        let mut builder = match config.tls {
            TlsMode::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
                .map_err(|e| NotifyError::Config(e.to_string()))?,
            TlsMode::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_server)
                .map_err(|e| NotifyError::Config(e.to_string()))?,
            TlsMode::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_server),
        }
        .port(config.smtp_port)
        .timeout(Some(timeout));

        if !config.password.is_empty() {
            builder = builder.credentials(Credentials::new(config.from.clone(), config.password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }

    fn build_message(&self, notification: &Notification) -> Result<Message, NotifyError> {
        let builder = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(&notification.subject);

        let message = match &notification.html {
            Some(html) => builder.header(ContentType::TEXT_HTML).body(html.clone()),
            None => builder.header(ContentType::TEXT_PLAIN).body(notification.text.clone()),
        };
        message.map_err(|e| NotifyError::Smtp(e.to_string()))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let message = self.build_message(notification)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        tracing::info!(
            channel = "email",
            subject = %notification.subject,
            to = %self.to,
            "notification delivered"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "email"
    }
}
