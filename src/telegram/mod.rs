//! Telegram transport module.
//!
//! Sends words and replies through the Bot API with rate limiting, and
//! routes inbound messages to the command handler.

mod dispatch;
mod rate_limiter;
mod sender;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatch::run_dispatcher;
pub use rate_limiter::RateLimiter;
pub use sender::{MessageSender, SendError, TelegramSender};
