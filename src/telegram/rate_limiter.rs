//! Rate limiter for outbound Telegram messages.
//!
//! The Bot API starts rejecting requests with `429 Too Many Requests` when
//! a bot sends faster than roughly thirty messages per second. A delivery
//! sweep over many subscribers would hit that quickly, so every outbound
//! message waits for its slot here.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

/// Rate limiter that enforces minimum intervals between operations.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum duration between allowed operations.
    min_interval: Duration,

    /// Last time an operation was performed.
    last_operation: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a new rate limiter with the specified minimum interval.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_operation: Mutex::new(None),
        }
    }

    /// Waits until an operation is allowed, then marks the operation as performed.
    ///
    /// Returns the duration waited (0 if no wait was needed).
    pub async fn wait_and_acquire(&self) -> Duration {
        let mut last = self.last_operation.lock().await;

        let wait_duration = last.map_or(Duration::ZERO, |last_time| {
            self.min_interval.saturating_sub(last_time.elapsed())
        });

        if !wait_duration.is_zero() {
            debug!("Rate limiter: waiting {:?} before next message", wait_duration);
            tokio::time::sleep(wait_duration).await;
        }

        *last = Some(Instant::now());
        wait_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiter_first_operation() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        let waited = limiter.wait_and_acquire().await;
        assert_eq!(waited, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_operations() {
        let limiter = RateLimiter::new(Duration::from_millis(20));
        let start = Instant::now();

        limiter.wait_and_acquire().await;
        limiter.wait_and_acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_zero_interval_never_waits() {
        let limiter = RateLimiter::new(Duration::ZERO);
        limiter.wait_and_acquire().await;
        assert_eq!(limiter.wait_and_acquire().await, Duration::ZERO);
    }
}
