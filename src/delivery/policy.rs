//! When a subscriber is due for a word, and when to give up on one.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::subscribers::Subscriber;

/// Delivery timing and failure tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPolicy {
    interval: Duration,
    max_failed_deliveries: u32,
}

impl DeliveryPolicy {
    /// `max_failed_deliveries` of zero keeps unreachable subscribers forever.
    #[must_use]
    pub const fn new(interval: Duration, max_failed_deliveries: u32) -> Self {
        Self {
            interval,
            max_failed_deliveries,
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Time left until `subscriber` is due, or `None` if due now.
    ///
    /// A last delivery stamped in the future counts as having just
    /// happened.
    #[must_use]
    pub fn remaining(&self, subscriber: &Subscriber, now: DateTime<Utc>) -> Option<Duration> {
        let last = subscriber.last_delivery_at?;
        let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
        (elapsed < self.interval).then(|| self.interval - elapsed)
    }

    #[must_use]
    pub fn is_due(&self, subscriber: &Subscriber, now: DateTime<Utc>) -> bool {
        self.remaining(subscriber, now).is_none()
    }

    /// Whether a streak of failed deliveries is long enough to drop the
    /// subscriber.
    #[must_use]
    pub const fn should_drop(&self, failed_deliveries: u32) -> bool {
        self.max_failed_deliveries > 0 && failed_deliveries >= self.max_failed_deliveries
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn ten_minutes() -> DeliveryPolicy {
        DeliveryPolicy::new(Duration::from_secs(600), 3)
    }

    #[test]
    fn test_never_delivered_is_due() {
        let subscriber = Subscriber::new("words");
        assert!(ten_minutes().is_due(&subscriber, Utc::now()));
    }

    #[test]
    fn test_due_after_interval() {
        let policy = ten_minutes();
        let now = Utc::now();
        let mut subscriber = Subscriber::new("words");

        subscriber.record_delivery(now);
        assert!(!policy.is_due(&subscriber, now));

        subscriber.record_delivery(now - TimeDelta::minutes(5));
        assert_eq!(
            policy.remaining(&subscriber, now),
            Some(Duration::from_secs(300))
        );

        subscriber.record_delivery(now - TimeDelta::minutes(10));
        assert!(policy.is_due(&subscriber, now));

        subscriber.record_delivery(now - TimeDelta::hours(3));
        assert!(policy.is_due(&subscriber, now));
    }

    #[test]
    fn test_future_timestamp_waits_full_interval() {
        let policy = ten_minutes();
        let now = Utc::now();
        let mut subscriber = Subscriber::new("words");
        subscriber.record_delivery(now + TimeDelta::minutes(1));

        assert_eq!(
            policy.remaining(&subscriber, now),
            Some(Duration::from_secs(600))
        );
    }

    #[test]
    fn test_should_drop_threshold() {
        let policy = ten_minutes();
        assert!(!policy.should_drop(2));
        assert!(policy.should_drop(3));

        let one_strike = DeliveryPolicy::new(Duration::from_secs(600), 1);
        assert!(one_strike.should_drop(1));

        let never = DeliveryPolicy::new(Duration::from_secs(600), 0);
        assert!(!never.should_drop(u32::MAX));
    }
}
