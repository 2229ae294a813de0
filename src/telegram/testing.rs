//! In-memory [`MessageSender`] for tests.

use std::collections::HashSet;
use std::sync::Mutex;

use super::{MessageSender, SendError};
use crate::subscribers::UserId;

/// Records every message instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(UserId, String)>>,
    unreachable: HashSet<UserId>,
    failing_fragments: Vec<String>,
    offline: bool,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send to `user` fails.
    pub fn unreachable(mut self, user: UserId) -> Self {
        self.unreachable.insert(user);
        self
    }

    /// Every message containing `fragment` fails.
    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.failing_fragments.push(fragment.to_owned());
        self
    }

    /// Every send fails as if the Bot API could not be reached.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Messages successfully sent so far.
    pub fn sent(&self) -> Vec<(UserId, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Messages successfully sent to one user.
    pub fn sent_to(&self, user: UserId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(to, _)| *to == user)
            .map(|(_, text)| text)
            .collect()
    }
}

impl MessageSender for RecordingSender {
    async fn send_text(&self, user: UserId, text: &str) -> Result<(), SendError> {
        if self.unreachable.contains(&user) {
            return Err(SendError::Unreachable(user));
        }
        if self.offline || self.failing_fragments.iter().any(|f| text.contains(f.as_str())) {
            return Err(SendError::Request("injected failure".to_owned()));
        }
        self.sent.lock().unwrap().push((user, text.to_owned()));
        Ok(())
    }
}
