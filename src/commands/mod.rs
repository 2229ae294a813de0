//! Command handling module.
//!
//! Processes user commands sent to the bot via Telegram messages, e.g.
//! `/start`, `/skip` or `/addlist <name>`.

mod handler;
mod types;

pub use handler::CommandHandler;
pub use types::{BotCommand, CommandParseError, CommandResult};
