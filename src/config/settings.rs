//! Application settings and Telegram configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Telegram Bot API configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by `@BotFather`.
    pub bot_token: String,
}

impl TelegramConfig {
    /// Creates a new Telegram configuration.
    #[must_use]
    pub const fn new(bot_token: String) -> Self {
        Self { bot_token }
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `BOT_TOKEN` to be set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token =
            std::env::var("BOT_TOKEN").map_err(|_| ConfigError::MissingEnvVar("BOT_TOKEN"))?;

        if bot_token.trim().is_empty() {
            return Err(ConfigError::EmptyToken);
        }

        Ok(Self {
            bot_token: bot_token.trim().to_owned(),
        })
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .finish()
    }
}

/// Bot-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Directory holding `<name>.txt` word-list files.
    #[serde(default = "default_wordlists_dir")]
    pub wordlists_dir: PathBuf,

    /// List assigned to new subscribers.
    #[serde(default = "default_list")]
    pub default_list: String,

    /// Path to the subscriber document.
    #[serde(default = "default_subscribers_path")]
    pub subscribers_path: PathBuf,

    /// Minimum spacing between non-forced deliveries to one user, in seconds.
    #[serde(default = "default_delivery_interval")]
    pub delivery_interval_secs: u64,

    /// How often the delivery sweep runs, in seconds.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Consecutive total delivery failures before a subscriber is dropped.
    /// Zero disables dropping.
    #[serde(default = "default_max_failed_deliveries")]
    pub max_failed_deliveries: u32,

    /// Minimum spacing between outbound messages, in milliseconds.
    #[serde(default = "default_send_interval")]
    pub send_interval_ms: u64,
}

fn default_wordlists_dir() -> PathBuf {
    PathBuf::from("wordlists")
}

fn default_list() -> String {
    "words".to_owned()
}

fn default_subscribers_path() -> PathBuf {
    PathBuf::from("users.json")
}

fn default_delivery_interval() -> u64 {
    24 * 60 * 60
}

fn default_check_interval() -> u64 {
    60
}

fn default_max_failed_deliveries() -> u32 {
    3
}

fn default_send_interval() -> u64 {
    50 // stays under the Bot API's ~30 messages per second
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            wordlists_dir: default_wordlists_dir(),
            default_list: default_list(),
            subscribers_path: default_subscribers_path(),
            delivery_interval_secs: default_delivery_interval(),
            check_interval_secs: default_check_interval(),
            max_failed_deliveries: default_max_failed_deliveries(),
            send_interval_ms: default_send_interval(),
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Malformed numbers fall
    /// back to their defaults.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let number = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

        Self {
            wordlists_dir: lookup("WORDLISTS_DIR").map_or_else(default_wordlists_dir, PathBuf::from),
            default_list: lookup("DEFAULT_LIST")
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(default_list),
            subscribers_path: lookup("SUBSCRIBERS_PATH")
                .map_or_else(default_subscribers_path, PathBuf::from),
            delivery_interval_secs: number("DELIVERY_INTERVAL_SECS")
                .filter(|&secs| secs > 0)
                .unwrap_or_else(default_delivery_interval),
            check_interval_secs: number("CHECK_INTERVAL_SECS")
                .filter(|&secs| secs > 0)
                .unwrap_or_else(default_check_interval),
            max_failed_deliveries: lookup("MAX_FAILED_DELIVERIES")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or_else(default_max_failed_deliveries),
            send_interval_ms: number("SEND_INTERVAL_MS").unwrap_or_else(default_send_interval),
        }
    }

    /// Delivery interval as a [`Duration`].
    #[must_use]
    pub const fn delivery_interval(&self) -> Duration {
        Duration::from_secs(self.delivery_interval_secs)
    }

    /// Sweep period as a [`Duration`].
    #[must_use]
    pub const fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Outbound message spacing as a [`Duration`].
    #[must_use]
    pub const fn send_interval(&self) -> Duration {
        Duration::from_millis(self.send_interval_ms)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("BOT_TOKEN is set but empty")]
    EmptyToken,
}
