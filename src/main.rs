//! Random Word Bot - Main Entry Point
//!
//! A Telegram bot that sends subscribers a random word from their chosen
//! word lists at a configured interval.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use teloxide::Bot;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use random_word_bot::commands::CommandHandler;
use random_word_bot::config::{BotSettings, TelegramConfig};
use random_word_bot::delivery::{Deliverer, DeliveryPolicy, DeliveryScheduler, SchedulerMessage};
use random_word_bot::subscribers::SubscriberStore;
use random_word_bot::telegram::{TelegramSender, run_dispatcher};
use random_word_bot::wordlist::WordListStore;

/// Telegram bot that periodically sends a random word.
#[derive(Parser, Debug)]
#[command(name = "random_word_bot")]
#[command(about = "Send Telegram subscribers a random word from chosen word lists")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    // Load configurations
    let tg_config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;

    let settings = BotSettings::from_env_with_defaults();
    debug!("Settings: {:?}", settings);

    let words = Arc::new(WordListStore::new(&settings.wordlists_dir));
    let available = words.list_available_names();
    info!(
        "Found {} word lists in {}",
        available.len(),
        settings.wordlists_dir.display()
    );
    if !available.contains(&settings.default_list) {
        warn!(
            "Default list '{}' has no file in {}, new subscribers will get a placeholder",
            settings.default_list,
            settings.wordlists_dir.display()
        );
    }

    let subscribers = Arc::new(SubscriberStore::new(
        &settings.subscribers_path,
        settings.default_list.clone(),
    ));
    match subscribers.snapshot().await {
        Ok(current) => info!(
            "Loaded {} subscribers from {}",
            current.len(),
            settings.subscribers_path.display()
        ),
        Err(e) => warn!("Subscriber document is unreadable, sweeps will be skipped: {}", e),
    }

    let bot = Bot::new(tg_config.bot_token);
    let sender = Arc::new(TelegramSender::new(bot.clone(), settings.send_interval()));

    let policy = DeliveryPolicy::new(settings.delivery_interval(), settings.max_failed_deliveries);
    let deliverer = Arc::new(Deliverer::new(sender, words, subscribers, policy));
    let handler = Arc::new(CommandHandler::new(Arc::clone(&deliverer)));

    // Create scheduler channel
    let (scheduler_tx, scheduler_rx) = mpsc::channel::<SchedulerMessage>(8);
    let scheduler = DeliveryScheduler::new(deliverer, settings.check_interval());

    info!("Starting random word bot...");

    // Spawn scheduler task
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run(scheduler_rx).await;
    });

    // Runs until Ctrl+C
    run_dispatcher(bot, handler).await;

    // Cleanup
    info!("Shutting down...");
    let _ = scheduler_tx.send(SchedulerMessage::Shutdown).await;
    let _ = scheduler_handle.await;

    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
