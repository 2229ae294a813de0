//! Command handler implementation.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::types::{BotCommand, CommandParseError, CommandResult};
use crate::delivery::{Deliverer, DeliveryOutcome};
use crate::subscribers::{ListChangeError, Subscriber, UserId};
use crate::telegram::MessageSender;

/// Number of words shown by `/list <name>`.
const PREVIEW_WORDS: usize = 10;

const SAVE_FAILED: &str = "Sorry, I couldn't save that change. Please try again later.";
const NOT_SUBSCRIBED: &str = "You are not subscribed. Send /start first.";
const STORE_UNAVAILABLE: &str =
    "Sorry, I couldn't reach your subscription right now. Please try again later.";

/// Why a list membership change did not happen.
enum MembershipError {
    NotSubscribed,
    Rejected(ListChangeError),
}

/// Handles bot commands for one user at a time.
pub struct CommandHandler<S> {
    deliverer: Arc<Deliverer<S>>,
}

impl<S: MessageSender> CommandHandler<S> {
    /// Creates a new command handler.
    #[must_use]
    pub const fn new(deliverer: Arc<Deliverer<S>>) -> Self {
        Self { deliverer }
    }

    /// Handles an inbound message from `user`.
    ///
    /// Anything that is not a known command gets the help text.
    pub async fn handle(&self, user: UserId, message_text: &str) -> CommandResult {
        let command = match BotCommand::parse(message_text) {
            Ok(command) => command,
            Err(CommandParseError::MissingArgument { usage }) => {
                return CommandResult::error(format!("Usage: {usage}"));
            }
            Err(e) => {
                debug!("User {} sent something else ({}), replying with help", user, e);
                return self.handle_help();
            }
        };

        debug!("Handling {} from user {}", command, user);
        let result = self.execute(user, command).await;
        debug!("Command result for user {}: success={}", user, result.success);
        result
    }

    /// Handles a message and sends the reply, if any, back to `user`.
    pub async fn respond(&self, user: UserId, message_text: &str) {
        let result = self.handle(user, message_text).await;
        if result.message.is_empty() {
            return;
        }
        if let Err(e) = self.deliverer.sender().send_text(user, &result.message).await {
            warn!("Failed to reply to user {}: {}", user, e);
        }
    }

    /// Executes a parsed command.
    async fn execute(&self, user: UserId, command: BotCommand) -> CommandResult {
        match command {
            BotCommand::Start => self.handle_start(user).await,
            BotCommand::Stop => self.handle_stop(user).await,
            BotCommand::Skip => self.handle_skip(user).await,
            BotCommand::Lists => self.handle_lists(user).await,
            BotCommand::AddList(name) => self.handle_add_list(user, &name).await,
            BotCommand::RemoveList(name) => self.handle_remove_list(user, &name).await,
            BotCommand::List(name) => self.handle_list(name.as_deref()).await,
            BotCommand::WordLists => self.handle_word_lists(user).await,
            BotCommand::Reload => self.handle_reload().await,
            BotCommand::Help => self.handle_help(),
        }
    }

    async fn handle_start(&self, user: UserId) -> CommandResult {
        let store = self.deliverer.subscribers();
        let default_list = store.default_list().to_owned();

        let created = store
            .update(|subs| subs.insert(user, Subscriber::new(default_list.clone())))
            .await;
        if let Err(e) = created {
            warn!("Failed to subscribe user {}: {}", user, e);
            return CommandResult::error(SAVE_FAILED);
        }
        info!("User {} subscribed with list '{}'", user, default_list);

        let every = format_duration(self.deliverer.policy().interval());
        let greeting = format!(
            "You're subscribed to '{default_list}'. You'll get a new word every {every}.\n\
             Use /addlist to add more lists, /skip for the next word, /stop to unsubscribe."
        );

        match self.deliverer.deliver(user, false).await {
            Ok(DeliveryOutcome::Delivered { .. }) => CommandResult::success(greeting),
            Ok(outcome) => {
                debug!("First delivery to user {} did not go out: {:?}", user, outcome);
                CommandResult::success(format!(
                    "{greeting}\nI couldn't send your first word just now, I'll try again soon."
                ))
            }
            Err(e) => {
                warn!("First delivery to user {} not recorded: {}", user, e);
                CommandResult::success(greeting)
            }
        }
    }

    async fn handle_stop(&self, user: UserId) -> CommandResult {
        match self
            .deliverer
            .subscribers()
            .update(|subs| subs.remove(&user).is_some())
            .await
        {
            Ok(true) => {
                info!("User {} unsubscribed", user);
                CommandResult::success("You've unsubscribed. Send /start to come back.")
            }
            Ok(false) => CommandResult::error("You are not subscribed."),
            Err(e) => {
                warn!("Failed to unsubscribe user {}: {}", user, e);
                CommandResult::error(SAVE_FAILED)
            }
        }
    }

    async fn handle_skip(&self, user: UserId) -> CommandResult {
        match self.deliverer.deliver(user, true).await {
            Ok(DeliveryOutcome::Delivered { .. } | DeliveryOutcome::NotDue { .. }) => {
                CommandResult::quiet()
            }
            Ok(DeliveryOutcome::NotSubscribed) => CommandResult::error(NOT_SUBSCRIBED),
            Ok(DeliveryOutcome::Failed { .. }) => {
                CommandResult::error("I couldn't send a word right now. Please try again later.")
            }
            Err(e) => {
                warn!("Skip for user {} not recorded: {}", user, e);
                CommandResult::error(STORE_UNAVAILABLE)
            }
        }
    }

    async fn handle_lists(&self, user: UserId) -> CommandResult {
        match self.deliverer.subscribers().get(user).await {
            Ok(Some(subscriber)) => CommandResult::success(format!(
                "Your active lists:\n{}",
                bullet_list(subscriber.lists())
            )),
            Ok(None) => CommandResult::error(NOT_SUBSCRIBED),
            Err(e) => {
                warn!("Failed to read lists of user {}: {}", user, e);
                CommandResult::error(STORE_UNAVAILABLE)
            }
        }
    }

    async fn handle_add_list(&self, user: UserId, name: &str) -> CommandResult {
        let available = self.deliverer.words().list_available_names();
        if !available.contains(name) {
            return CommandResult::error(format!(
                "There is no list called '{name}'.\n{}",
                describe_available(&available)
            ));
        }

        let outcome = self
            .update_membership(user, |subscriber| subscriber.add_list(name))
            .await;

        match outcome {
            Ok(Ok(lists)) => {
                info!("User {} added list '{}'", user, name);
                CommandResult::success(format!(
                    "Added '{name}'. Your active lists:\n{}",
                    bullet_list(&lists)
                ))
            }
            Ok(Err(MembershipError::NotSubscribed)) => CommandResult::error(NOT_SUBSCRIBED),
            Ok(Err(MembershipError::Rejected(_))) => {
                CommandResult::error(format!("'{name}' is already one of your lists."))
            }
            Err(()) => CommandResult::error(SAVE_FAILED),
        }
    }

    async fn handle_remove_list(&self, user: UserId, name: &str) -> CommandResult {
        let outcome = self
            .update_membership(user, |subscriber| subscriber.remove_list(name))
            .await;

        match outcome {
            Ok(Ok(lists)) => {
                info!("User {} removed list '{}'", user, name);
                CommandResult::success(format!(
                    "Removed '{name}'. Your active lists:\n{}",
                    bullet_list(&lists)
                ))
            }
            Ok(Err(MembershipError::NotSubscribed)) => CommandResult::error(NOT_SUBSCRIBED),
            Ok(Err(MembershipError::Rejected(ListChangeError::LastList(_)))) => {
                CommandResult::error(format!(
                    "'{name}' is your only list and can't be removed. \
                     Add another with /addlist first, or /stop to unsubscribe."
                ))
            }
            Ok(Err(MembershipError::Rejected(_))) => {
                CommandResult::error(format!("'{name}' is not one of your lists. See /lists."))
            }
            Err(()) => CommandResult::error(SAVE_FAILED),
        }
    }

    /// Applies a list membership change and returns the resulting lists.
    ///
    /// The outer `Err` means the store could not be saved.
    async fn update_membership(
        &self,
        user: UserId,
        change: impl FnOnce(&mut Subscriber) -> Result<(), ListChangeError>,
    ) -> Result<Result<Vec<String>, MembershipError>, ()> {
        self.deliverer
            .subscribers()
            .update(|subs| -> Result<Vec<String>, MembershipError> {
                let subscriber = subs.get_mut(&user).ok_or(MembershipError::NotSubscribed)?;
                change(subscriber).map_err(MembershipError::Rejected)?;
                Ok(subscriber.lists().to_vec())
            })
            .await
            .map_err(|e| warn!("Failed to save list change for user {}: {}", user, e))
    }

    async fn handle_list(&self, name: Option<&str>) -> CommandResult {
        let words = self.deliverer.words();
        let available = words.list_available_names();

        let Some(name) = name else {
            if available.is_empty() {
                return CommandResult::error("No word lists available.");
            }
            let mut message = "Word lists:".to_owned();
            for list in &available {
                let count = words.word_count(list).await.unwrap_or(0);
                let _ = write!(message, "\n• {list} ({count} words)");
            }
            return CommandResult::success(message);
        };

        if !available.contains(name) {
            return CommandResult::error(format!(
                "There is no list called '{name}'.\n{}",
                describe_available(&available)
            ));
        }

        match words.preview(name, PREVIEW_WORDS).await {
            Some((total, sample)) => {
                let mut message = format!("'{name}' has {total} words. First {}:", sample.len());
                for word in &sample {
                    let _ = write!(message, "\n• {word}");
                }
                CommandResult::success(message)
            }
            None => CommandResult::success(format!("'{name}' is empty.")),
        }
    }

    async fn handle_word_lists(&self, user: UserId) -> CommandResult {
        let available = self.deliverer.words().list_available_names();
        if available.is_empty() {
            return CommandResult::error("No word lists available.");
        }

        let active = self
            .deliverer
            .subscribers()
            .get(user)
            .await
            .ok()
            .flatten()
            .map(|s| s.lists().to_vec())
            .unwrap_or_default();

        let mut message = "Available word lists:".to_owned();
        for list in &available {
            let marker = if active.contains(list) { "✓" } else { "•" };
            let _ = write!(message, "\n{marker} {list}");
        }
        CommandResult::success(message)
    }

    async fn handle_reload(&self) -> CommandResult {
        let names = self.deliverer.words().reload().await;
        CommandResult::success(format!("Reloaded word lists.\n{}", describe_available(&names)))
    }

    fn handle_help(&self) -> CommandResult {
        let mut lines = vec!["I send you a random word from your chosen lists.".to_owned()];
        lines.push(format!(
            "A new word arrives every {}.\n",
            format_duration(self.deliverer.policy().interval())
        ));
        for (usage, description) in BotCommand::all_commands() {
            lines.push(format!("{usage} - {description}"));
        }
        CommandResult::success(lines.join("\n"))
    }
}

impl<S> std::fmt::Debug for CommandHandler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandler").finish_non_exhaustive()
    }
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("• {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn describe_available(available: &BTreeSet<String>) -> String {
    if available.is_empty() {
        return "No word lists are available.".to_owned();
    }
    let names: Vec<&str> = available.iter().map(String::as_str).collect();
    format!("Available lists: {}", names.join(", "))
}

/// Formats a duration for display (e.g., "1h 30m").
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    let parts: Vec<String> = [(days, "d"), (hours, "h"), (minutes, "m"), (seconds, "s")]
        .into_iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect();

    if parts.is_empty() {
        "0s".to_owned()
    } else {
        parts.join(" ")
    }
}
