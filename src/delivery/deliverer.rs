//! Word delivery to subscribers.
//!
//! A delivery sends one random word per active list:
//! 1. Reload the subscriber record (unsubscribed users get nothing)
//! 2. Unless forced, stop if the delivery interval has not elapsed
//! 3. For each list: load it, pick a word, send it (no locks held)
//! 4. If anything was sent → stamp `last_delivery_at` and save
//!
//! The sweep runs this for every due subscriber. A delivery in which every
//! send failed because the user is unreachable counts toward the
//! subscriber's failure streak; a long enough streak removes the
//! subscriber. Transient send errors are retried on the next sweep and
//! never count.

use std::slice;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use super::DeliveryPolicy;
use crate::subscribers::{StoreError, SubscriberStore, UserId};
use crate::telegram::{MessageSender, SendError};
use crate::wordlist::{SENTINEL_WORD, WordListStore};

/// Result of a single delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// At least one list produced a word; `last_delivery_at` was updated.
    Delivered { sent: usize, failed: usize },

    /// Not forced and the interval has not elapsed yet.
    NotDue { remaining: Duration },

    /// Every send failed; nothing was recorded.
    ///
    /// `unreachable` is set if Telegram reported the user as gone for at
    /// least one of the sends.
    Failed { unreachable: bool },

    /// The user has no subscriber record.
    NotSubscribed,
}

/// Counters for one delivery sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub delivered: usize,
    pub not_due: usize,
    pub failed: usize,
    pub dropped: usize,
}

impl SweepReport {
    /// Whether the sweep did anything worth logging at info level.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.delivered == 0 && self.failed == 0 && self.dropped == 0
    }
}

/// Sends words to subscribers and records the deliveries.
pub struct Deliverer<S> {
    sender: Arc<S>,
    words: Arc<WordListStore>,
    subscribers: Arc<SubscriberStore>,
    policy: DeliveryPolicy,
}

impl<S: MessageSender> Deliverer<S> {
    #[must_use]
    pub const fn new(
        sender: Arc<S>,
        words: Arc<WordListStore>,
        subscribers: Arc<SubscriberStore>,
        policy: DeliveryPolicy,
    ) -> Self {
        Self {
            sender,
            words,
            subscribers,
            policy,
        }
    }

    #[must_use]
    pub fn sender(&self) -> &Arc<S> {
        &self.sender
    }

    #[must_use]
    pub fn words(&self) -> &Arc<WordListStore> {
        &self.words
    }

    #[must_use]
    pub fn subscribers(&self) -> &Arc<SubscriberStore> {
        &self.subscribers
    }

    #[must_use]
    pub const fn policy(&self) -> &DeliveryPolicy {
        &self.policy
    }

    /// Delivers one word per active list to `user`.
    ///
    /// Returns `Err` when the subscriber document could not be read, or
    /// when words went out but the new delivery time could not be saved.
    pub async fn deliver(&self, user: UserId, force: bool) -> Result<DeliveryOutcome, StoreError> {
        let Some(subscriber) = self.subscribers.get(user).await? else {
            return Ok(DeliveryOutcome::NotSubscribed);
        };

        if !force && let Some(remaining) = self.policy.remaining(&subscriber, Utc::now()) {
            debug!("User {} not due, {}s remaining", user, remaining.as_secs());
            return Ok(DeliveryOutcome::NotDue { remaining });
        }

        let labelled = subscriber.lists().len() > 1;
        let mut sent = 0;
        let mut failed = 0;
        let mut unreachable = false;

        for list in subscriber.lists() {
            let words = self.words.load(slice::from_ref(list)).await;
            let word = pick_word(&words);
            let text = if labelled {
                format!("[{list}] {word}")
            } else {
                word
            };

            match self.sender.send_text(user, &text).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    warn!("Failed to send word from '{}' to user {}: {}", list, user, e);
                    unreachable |= matches!(e, SendError::Unreachable(_));
                    failed += 1;
                }
            }
        }

        if sent == 0 {
            return Ok(DeliveryOutcome::Failed { unreachable });
        }

        let now = Utc::now();
        self.subscribers
            .update(|subs| {
                if let Some(subscriber) = subs.get_mut(&user) {
                    subscriber.record_delivery(now);
                }
            })
            .await?;

        debug!("Delivered {} word(s) to user {} ({} failed)", sent, user, failed);
        Ok(DeliveryOutcome::Delivered { sent, failed })
    }

    /// Delivers to every subscriber that is due.
    ///
    /// One subscriber's failure never stops the sweep. If the subscriber
    /// document cannot be read, the sweep is skipped.
    pub async fn deliver_due_all(&self) -> SweepReport {
        let mut report = SweepReport::default();
        let now = Utc::now();

        let subscribers = match self.subscribers.snapshot().await {
            Ok(subscribers) => subscribers,
            Err(e) => {
                warn!("Skipping delivery sweep: {}", e);
                return report;
            }
        };

        for (user, subscriber) in subscribers {
            if !self.policy.is_due(&subscriber, now) {
                report.not_due += 1;
                continue;
            }

            match self.deliver(user, false).await {
                Ok(DeliveryOutcome::Delivered { .. }) => report.delivered += 1,
                Ok(DeliveryOutcome::NotDue { .. }) => report.not_due += 1,
                Ok(DeliveryOutcome::NotSubscribed) => {}
                Ok(DeliveryOutcome::Failed { unreachable: false }) => report.failed += 1,
                Ok(DeliveryOutcome::Failed { unreachable: true }) => {
                    report.failed += 1;
                    match self.record_failure(user).await {
                        Ok(true) => report.dropped += 1,
                        Ok(false) => {}
                        Err(e) => warn!("Failed to record delivery failure for user {}: {}", user, e),
                    }
                }
                Err(e) => {
                    warn!("Delivery to user {} not recorded: {}", user, e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Extends the user's unreachable streak, dropping them at the threshold.
    ///
    /// Returns whether the user was dropped.
    async fn record_failure(&self, user: UserId) -> Result<bool, StoreError> {
        let policy = self.policy;
        let dropped = self
            .subscribers
            .update(|subs| {
                let Some(subscriber) = subs.get_mut(&user) else {
                    return None;
                };
                let streak = subscriber.record_failure();
                if policy.should_drop(streak) {
                    subs.remove(&user);
                    return Some(streak);
                }
                None
            })
            .await?;

        if let Some(streak) = dropped {
            info!("Dropped user {} after {} failed deliveries", user, streak);
        }
        Ok(dropped.is_some())
    }
}

fn pick_word(words: &[String]) -> String {
    words
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_else(|| SENTINEL_WORD.to_owned())
}

impl<S> std::fmt::Debug for Deliverer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deliverer")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
