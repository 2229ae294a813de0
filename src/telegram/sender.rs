//! Outbound text messages.

use std::future::Future;
use std::time::Duration;

use teloxide::ApiError;
use teloxide::RequestError;
use teloxide::prelude::*;
use thiserror::Error;

use super::RateLimiter;
use crate::subscribers::UserId;

/// Errors that can occur when sending a message.
#[derive(Debug, Error)]
pub enum SendError {
    /// The user blocked the bot, deleted their account, or the chat is gone.
    #[error("Recipient {0} is unreachable")]
    Unreachable(UserId),

    #[error("Telegram request failed: {0}")]
    Request(String),
}

impl SendError {
    fn from_request(user: UserId, err: RequestError) -> Self {
        match err {
            RequestError::Api(
                ApiError::BotBlocked | ApiError::UserDeactivated | ApiError::ChatNotFound,
            ) => Self::Unreachable(user),
            other => Self::Request(other.to_string()),
        }
    }
}

/// Something that can deliver a text message to a user.
pub trait MessageSender: Send + Sync {
    /// Sends `text` to the private chat of `user`.
    fn send_text(
        &self,
        user: UserId,
        text: &str,
    ) -> impl Future<Output = Result<(), SendError>> + Send;
}

/// [`MessageSender`] backed by the Telegram Bot API.
#[derive(Debug)]
pub struct TelegramSender {
    bot: Bot,
    rate_limiter: RateLimiter,
}

impl TelegramSender {
    /// Creates a sender spacing messages at least `min_interval` apart.
    #[must_use]
    pub fn new(bot: Bot, min_interval: Duration) -> Self {
        Self {
            bot,
            rate_limiter: RateLimiter::new(min_interval),
        }
    }
}

impl MessageSender for TelegramSender {
    async fn send_text(&self, user: UserId, text: &str) -> Result<(), SendError> {
        self.rate_limiter.wait_and_acquire().await;

        self.bot
            .send_message(ChatId(user), text)
            .await
            .map(|_| ())
            .map_err(|e| SendError::from_request(user, e))
    }
}
