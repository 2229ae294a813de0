//! Subscriber records and their persisted document form.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Messaging platform identity of a subscriber (the private chat id).
pub type UserId = i64;

/// All subscribers, keyed by user id. A user absent from the map is
/// unsubscribed.
pub type Subscribers = BTreeMap<UserId, Subscriber>;

/// Current schema version of the subscriber document.
pub const DOCUMENT_VERSION: u32 = 2;

/// Rejected changes to a subscriber's list membership.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListChangeError {
    #[error("List '{0}' is already active")]
    AlreadyActive(String),

    #[error("List '{0}' is not active")]
    NotActive(String),

    #[error("List '{0}' is the only active list and cannot be removed")]
    LastList(String),
}

/// Per-user delivery state.
///
/// The list collection is never empty: constructors require at least one
/// list and [`Subscriber::remove_list`] refuses to remove the last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    /// When the last successful delivery happened. `None` means never.
    pub last_delivery_at: Option<DateTime<Utc>>,

    /// Consecutive deliveries in which every send failed.
    pub failed_deliveries: u32,

    lists: Vec<String>,
}

impl Subscriber {
    /// A fresh subscriber with a single list and no deliveries yet.
    #[must_use]
    pub fn new(list: impl Into<String>) -> Self {
        Self {
            last_delivery_at: None,
            failed_deliveries: 0,
            lists: vec![list.into()],
        }
    }

    /// Builds a subscriber from a list sequence, dropping duplicates.
    ///
    /// Returns `None` if no list names are given.
    #[must_use]
    pub fn with_lists(lists: impl IntoIterator<Item = String>) -> Option<Self> {
        let mut unique: Vec<String> = Vec::new();
        for name in lists {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }

        if unique.is_empty() {
            return None;
        }

        Some(Self {
            last_delivery_at: None,
            failed_deliveries: 0,
            lists: unique,
        })
    }

    /// Active list names in subscription order.
    #[must_use]
    pub fn lists(&self) -> &[String] {
        &self.lists
    }

    #[must_use]
    pub fn has_list(&self, name: &str) -> bool {
        self.lists.iter().any(|l| l == name)
    }

    /// Appends a list to the active set.
    pub fn add_list(&mut self, name: &str) -> Result<(), ListChangeError> {
        if self.has_list(name) {
            return Err(ListChangeError::AlreadyActive(name.to_owned()));
        }
        self.lists.push(name.to_owned());
        Ok(())
    }

    /// Removes a list from the active set, refusing to empty it.
    pub fn remove_list(&mut self, name: &str) -> Result<(), ListChangeError> {
        let Some(index) = self.lists.iter().position(|l| l == name) else {
            return Err(ListChangeError::NotActive(name.to_owned()));
        };
        if self.lists.len() == 1 {
            return Err(ListChangeError::LastList(name.to_owned()));
        }
        self.lists.remove(index);
        Ok(())
    }

    /// Records a delivery in which at least one word was sent.
    pub fn record_delivery(&mut self, at: DateTime<Utc>) {
        self.last_delivery_at = Some(at);
        self.failed_deliveries = 0;
    }

    /// Records a delivery in which every send failed; returns the new streak.
    pub fn record_failure(&mut self) -> u32 {
        self.failed_deliveries = self.failed_deliveries.saturating_add(1);
        self.failed_deliveries
    }
}

/// Checks that every subscriber has at least one list.
#[must_use]
pub fn all_have_lists(subscribers: &Subscribers) -> bool {
    subscribers.values().all(|s| !s.lists().is_empty())
}

/// On-disk JSON representation of [`Subscribers`].
///
/// User ids are string-encoded map keys. Timestamps are ISO-8601 strings;
/// naive timestamps without an offset are read as UTC.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriberDocument {
    #[serde(default)]
    pub version: u32,

    #[serde(default)]
    pub active_users: BTreeMap<String, Option<String>>,

    #[serde(default)]
    pub user_lists: BTreeMap<String, Vec<String>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub failed_deliveries: BTreeMap<String, u32>,
}

impl SubscriberDocument {
    /// Encodes subscribers into the document form.
    #[must_use]
    pub fn from_subscribers(subscribers: &Subscribers) -> Self {
        let mut doc = Self {
            version: DOCUMENT_VERSION,
            ..Self::default()
        };

        for (id, subscriber) in subscribers {
            let key = id.to_string();
            doc.active_users.insert(
                key.clone(),
                subscriber
                    .last_delivery_at
                    .map(|at| at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            );
            doc.user_lists.insert(key.clone(), subscriber.lists.clone());
            if subscriber.failed_deliveries > 0 {
                doc.failed_deliveries
                    .insert(key, subscriber.failed_deliveries);
            }
        }

        doc
    }

    /// Decodes the document, normalising records that break invariants.
    ///
    /// Users in `active_users` without lists get `default_list`. Entries
    /// with a non-numeric id are dropped.
    #[must_use]
    pub fn into_subscribers(mut self, default_list: &str) -> Subscribers {
        let mut subscribers = Subscribers::new();

        for (key, timestamp) in self.active_users {
            let Ok(id) = key.trim().parse::<UserId>() else {
                warn!("Ignoring subscriber with invalid id '{}'", key);
                continue;
            };

            let lists = self.user_lists.remove(&key).unwrap_or_default();
            let mut subscriber = Subscriber::with_lists(lists)
                .unwrap_or_else(|| Subscriber::new(default_list));

            subscriber.last_delivery_at = timestamp.as_deref().and_then(|raw| {
                let parsed = parse_timestamp(raw);
                if parsed.is_none() {
                    warn!("Ignoring unreadable timestamp '{}' for user {}", raw, id);
                }
                parsed
            });
            subscriber.failed_deliveries =
                self.failed_deliveries.get(&key).copied().unwrap_or_default();

            subscribers.insert(id, subscriber);
        }

        subscribers
    }
}

/// Parses an RFC 3339 timestamp, or a naive ISO-8601 one as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_remove_last_list_rejected() {
        let mut subscriber = Subscriber::new("words");
        assert_eq!(
            subscriber.remove_list("words"),
            Err(ListChangeError::LastList("words".to_owned()))
        );
        assert_eq!(subscriber.lists(), ["words"]);
    }

    #[test]
    fn test_add_and_remove_lists() {
        let mut subscriber = Subscriber::new("words");
        subscriber.add_list("fenia").unwrap();
        assert_eq!(
            subscriber.add_list("fenia"),
            Err(ListChangeError::AlreadyActive("fenia".to_owned()))
        );
        assert_eq!(
            subscriber.remove_list("ghost"),
            Err(ListChangeError::NotActive("ghost".to_owned()))
        );
        subscriber.remove_list("words").unwrap();
        assert_eq!(subscriber.lists(), ["fenia"]);
    }

    #[test]
    fn test_with_lists_dedups_and_rejects_empty() {
        let subscriber =
            Subscriber::with_lists(["a", "b", "a"].map(str::to_owned)).unwrap();
        assert_eq!(subscriber.lists(), ["a", "b"]);
        assert!(Subscriber::with_lists(Vec::new()).is_none());
    }

    #[test]
    fn test_failure_streak_resets_on_delivery() {
        let mut subscriber = Subscriber::new("words");
        assert_eq!(subscriber.record_failure(), 1);
        assert_eq!(subscriber.record_failure(), 2);
        subscriber.record_delivery(Utc::now());
        assert_eq!(subscriber.failed_deliveries, 0);
        assert!(subscriber.last_delivery_at.is_some());
    }

    #[test]
    fn test_document_round_trip() {
        let mut subscribers = Subscribers::new();
        let mut first = Subscriber::with_lists(["fenia", "words"].map(str::to_owned)).unwrap();
        first.record_delivery(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap());
        first.record_failure();
        subscribers.insert(42, first);
        subscribers.insert(-100_500, Subscriber::new("words"));

        let doc = SubscriberDocument::from_subscribers(&subscribers);
        assert_eq!(doc.version, DOCUMENT_VERSION);
        assert_eq!(doc.active_users["-100500"], None);

        let json = serde_json::to_string(&doc).unwrap();
        let decoded: SubscriberDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.into_subscribers("words"), subscribers);
    }

    #[test]
    fn test_document_normalises_missing_lists() {
        let json = r#"{
            "active_users": {"7": "2024-05-01T12:00:00.123456", "oops": null},
            "user_lists": {"7": [], "8": ["orphan"]}
        }"#;
        let doc: SubscriberDocument = serde_json::from_str(json).unwrap();
        let subscribers = doc.into_subscribers("words");

        assert_eq!(subscribers.len(), 1);
        let subscriber = &subscribers[&7];
        assert_eq!(subscriber.lists(), ["words"]);
        assert_eq!(
            subscriber.last_delivery_at.map(|at| at.timestamp()),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap().timestamp())
        );
        assert!(all_have_lists(&subscribers));
    }

    #[test]
    fn test_unreadable_timestamp_means_never_delivered() {
        let json = r#"{"active_users": {"7": "yesterday"}, "user_lists": {"7": ["words"]}}"#;
        let doc: SubscriberDocument = serde_json::from_str(json).unwrap();
        let subscribers = doc.into_subscribers("words");
        assert_eq!(subscribers[&7].last_delivery_at, None);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_timestamp("2024-01-02T03:04:05Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02T05:04:05+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02T03:04:05"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-02 03:04:05"), Some(expected));
        assert_eq!(parse_timestamp("not a date"), None);
    }
}
