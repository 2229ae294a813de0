//! Configuration module for the word bot.
//!
//! Handles loading of bot settings and Telegram credentials from the
//! environment.

mod settings;

pub use settings::{BotSettings, ConfigError, TelegramConfig};
