use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Overrides `notifier.password` for the email channel.
pub const SMTP_PASSWORD_ENV: &str = "COURT_MONITOR_SMTP_PASSWORD";
/// Overrides `notifier.api_key` for the chat channel.
pub const CHAT_API_KEY_ENV: &str = "COURT_MONITOR_CHAT_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Venues (clubs) whose courts are queried
    pub tenant_ids: Vec<String>,

    /// Courts that never produce notifications (e.g. outdoor courts)
    #[serde(default)]
    pub ignored_resources: Vec<String>,

    /// Slots starting before this hour are dropped
    #[serde(default)]
    pub min_hour: Option<u32>,

    /// Seconds to wait after a completed cycle
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Seconds to wait after a failed cycle
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// Number of days checked, starting today
    #[serde(default = "default_days_ahead")]
    pub days_ahead: u32,

    /// Per-request timeout for the availability API
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Pause between two availability requests
    #[serde(default = "default_request_pause")]
    pub request_pause_ms: u64,

    /// Maximum number of slots listed in one notification
    #[serde(default = "default_max_listed_slots")]
    pub max_listed_slots: usize,

    #[serde(default = "default_sport_id")]
    pub sport_id: String,

    #[serde(default = "default_availability_url")]
    pub availability_url: String,

    /// Link appended to every notification
    #[serde(default = "default_booking_url")]
    pub booking_url: String,

    /// The single delivery channel for this deployment
    pub notifier: NotifierConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum NotifierConfig {
    Email(EmailConfig),
    Chat(ChatConfig),
}

impl NotifierConfig {
    pub fn channel_name(&self) -> &'static str {
        match self {
            NotifierConfig::Email(_) => "email",
            NotifierConfig::Chat(_) => "chat",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Sender address, also used as the SMTP login
    pub from: String,

    /// SMTP password (an app password for Gmail)
    #[serde(default)]
    pub password: String,

    pub to: String,

    #[serde(default = "default_smtp_server")]
    pub smtp_server: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub tls: TlsMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsMode {
    #[default]
    Starttls,
    Implicit,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Recipient handle; for WhatsApp the phone number with country code, no `+`
    pub recipient: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_relay_url")]
    pub relay_url: String,
}

fn default_check_interval() -> u64 {
    300 // 5 minutes
}

fn default_retry_delay() -> u64 {
    60
}

fn default_days_ahead() -> u32 {
    5
}

fn default_request_timeout() -> u64 {
    10
}

fn default_request_pause() -> u64 {
    1000
}

fn default_max_listed_slots() -> usize {
    10
}

fn default_sport_id() -> String {
    "PADEL".to_string()
}

fn default_availability_url() -> String {
    "https://playtomic.com/api/clubs/availability".to_string()
}

fn default_booking_url() -> String {
    "https://playtomic.io".to_string()
}

fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_relay_url() -> String {
    "https://api.callmebot.com/whatsapp.php".to_string()
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::parse(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Secrets may live in the environment (or `.env`) instead of the file.
    pub fn apply_env_overrides(&mut self) {
        match &mut self.notifier {
            NotifierConfig::Email(email) => {
                if let Ok(password) = std::env::var(SMTP_PASSWORD_ENV) {
                    email.password = password;
                }
            }
            NotifierConfig::Chat(chat) => {
                if let Ok(api_key) = std::env::var(CHAT_API_KEY_ENV) {
                    chat.api_key = api_key;
                }
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.tenant_ids.is_empty() {
            bail!("tenant_ids must list at least one tenant");
        }
        if self.days_ahead == 0 {
            bail!("days_ahead must be at least 1");
        }
        if self.check_interval_secs == 0 {
            bail!("check_interval_secs must be at least 1");
        }
        if self.retry_delay_secs == 0 {
            bail!("retry_delay_secs must be at least 1");
        }
        if self.max_listed_slots == 0 {
            bail!("max_listed_slots must be at least 1");
        }
        if let Some(hour) = self.min_hour {
            if hour > 23 {
                bail!("min_hour must be between 0 and 23, got {}", hour);
            }
        }
        Ok(())
    }

    /// Human-readable summary of the active filters, for startup logs.
    pub fn filter_summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.ignored_resources.is_empty() {
            parts.push(format!("{} ignored court(s)", self.ignored_resources.len()));
        }
        if let Some(hour) = self.min_hour {
            parts.push(format!("after {}:00", hour));
        }
        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join(", ")
        }
    }

    pub fn example() -> Self {
        Config {
            tenant_ids: vec!["5bb4ad71-dbd9-499e-88fb-c9a5e7df6db6".to_string()],
            ignored_resources: vec!["75318066-28dd-40a1-8936-acb5cb61f652".to_string()],
            min_hour: Some(17),
            check_interval_secs: default_check_interval(),
            retry_delay_secs: default_retry_delay(),
            days_ahead: default_days_ahead(),
            request_timeout_secs: default_request_timeout(),
            request_pause_ms: default_request_pause(),
            max_listed_slots: default_max_listed_slots(),
            sport_id: default_sport_id(),
            availability_url: default_availability_url(),
            booking_url: default_booking_url(),
            notifier: NotifierConfig::Chat(ChatConfig {
                recipient: "4915112345678".to_string(),
                api_key: "123456".to_string(),
                relay_url: default_relay_url(),
            }),
        }
    }
}
