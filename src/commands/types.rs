//! Command types and definitions.

use std::fmt;

use thiserror::Error;

/// Why a message could not be turned into a [`BotCommand`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("Message is not a command")]
    NotACommand,

    #[error("Unknown command: /{0}")]
    Unknown(String),

    #[error("Missing argument, usage: {usage}")]
    MissingArgument { usage: &'static str },
}

/// Available bot commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Subscribe with the default list and get a first word right away.
    Start,

    /// Unsubscribe and forget the user.
    Stop,

    /// Get the next word now, regardless of the interval.
    Skip,

    /// Show the user's active lists.
    Lists,

    /// Activate a word list.
    AddList(String),

    /// Deactivate a word list.
    RemoveList(String),

    /// Show all lists with sizes, or a preview of one list.
    List(Option<String>),

    /// Show available word lists.
    WordLists,

    /// Re-read the word list directory.
    Reload,

    /// Show help information.
    Help,
}

impl BotCommand {
    /// Parses a command from a message text.
    ///
    /// Accepts the `/command@BotName` form used in group chats.
    pub fn parse(text: &str) -> Result<Self, CommandParseError> {
        let text = text.trim();

        let Some(after_slash) = text.strip_prefix('/') else {
            return Err(CommandParseError::NotACommand);
        };

        let (head, args) = match after_slash.split_once(char::is_whitespace) {
            Some((head, args)) => (head, Some(args.trim()).filter(|a| !a.is_empty())),
            None => (after_slash, None),
        };

        let cmd = head
            .split_once('@')
            .map_or(head, |(cmd, _bot)| cmd)
            .to_lowercase();

        let required = |usage: &'static str| {
            args.map(first_word)
                .ok_or(CommandParseError::MissingArgument { usage })
        };

        match cmd.as_str() {
            "start" | "subscribe" => Ok(Self::Start),
            "stop" | "unsubscribe" => Ok(Self::Stop),
            "skip" | "next" => Ok(Self::Skip),
            "lists" | "mylists" => Ok(Self::Lists),
            "addlist" => required("/addlist <name>").map(Self::AddList),
            "remlist" | "removelist" => required("/remlist <name>").map(Self::RemoveList),
            "list" => Ok(Self::List(args.map(first_word))),
            "wordlists" => Ok(Self::WordLists),
            "reload" => Ok(Self::Reload),
            "help" => Ok(Self::Help),
            _ => Err(CommandParseError::Unknown(cmd)),
        }
    }

    /// Returns the command name as it appears in help.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Skip => "skip",
            Self::Lists => "lists",
            Self::AddList(_) => "addlist",
            Self::RemoveList(_) => "remlist",
            Self::List(_) => "list",
            Self::WordLists => "wordlists",
            Self::Reload => "reload",
            Self::Help => "help",
        }
    }

    /// Returns all available commands with their descriptions.
    #[must_use]
    pub fn all_commands() -> Vec<(&'static str, &'static str)> {
        vec![
            ("/start", "Subscribe and get your first word"),
            ("/stop", "Unsubscribe"),
            ("/skip", "Get the next word right now"),
            ("/lists", "Show your active word lists"),
            ("/addlist <name>", "Start receiving words from a list"),
            ("/remlist <name>", "Stop receiving words from a list"),
            ("/list [name]", "Show list sizes, or preview one list"),
            ("/wordlists", "Show available word lists"),
            ("/reload", "Re-read word lists from disk"),
            ("/help", "Show this help message"),
        ]
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddList(name) | Self::RemoveList(name) | Self::List(Some(name)) => {
                write!(f, "/{} {name}", self.name())
            }
            _ => write!(f, "/{}", self.name()),
        }
    }
}

fn first_word(args: &str) -> String {
    args.split_whitespace().next().unwrap_or_default().to_owned()
}

/// Result of command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command was successful.
    pub success: bool,

    /// Reply to show the user. Empty means no reply.
    pub message: String,
}

impl CommandResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Creates a successful result that needs no reply.
    #[must_use]
    pub const fn quiet() -> Self {
        Self {
            success: true,
            message: String::new(),
        }
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
