//! Inbound message handling via long polling.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, info};

use super::TelegramSender;
use crate::commands::CommandHandler;

/// Polls Telegram for messages and answers them until Ctrl+C.
pub async fn run_dispatcher(bot: Bot, handler: Arc<CommandHandler<TelegramSender>>) {
    info!("Listening for messages");

    let schema = Update::filter_message().endpoint(on_message);

    Dispatcher::builder(bot, schema)
        .dependencies(dptree::deps![handler])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn on_message(
    msg: Message,
    handler: Arc<CommandHandler<TelegramSender>>,
) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        debug!("Ignoring non-text message in chat {}", msg.chat.id);
        return Ok(());
    };

    handler.respond(msg.chat.id.0, text).await;
    Ok(())
}
