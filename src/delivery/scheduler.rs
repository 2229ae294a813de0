//! Periodic delivery sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use super::Deliverer;
use crate::telegram::MessageSender;

/// Messages that can be sent to the scheduler.
#[derive(Debug, Clone)]
pub enum SchedulerMessage {
    /// Stop the scheduler.
    Shutdown,
}

/// Runs [`Deliverer::deliver_due_all`] on a fixed period.
pub struct DeliveryScheduler<S> {
    deliverer: Arc<Deliverer<S>>,
    check_interval: Duration,
}

impl<S: MessageSender> DeliveryScheduler<S> {
    #[must_use]
    pub const fn new(deliverer: Arc<Deliverer<S>>, check_interval: Duration) -> Self {
        Self {
            deliverer,
            check_interval,
        }
    }

    /// Runs the scheduler loop until shutdown or until all senders are gone.
    ///
    /// The first sweep happens immediately.
    pub async fn run(&self, mut rx: mpsc::Receiver<SchedulerMessage>) {
        info!(
            "Delivery scheduler started (sweep every {}s, deliver every {}s)",
            self.check_interval.as_secs(),
            self.deliverer.policy().interval().as_secs()
        );

        let mut check_timer = interval(self.check_interval);
        check_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = check_timer.tick() => {
                    self.sweep().await;
                }
                // Shutdown, or every sender is gone.
                _ = rx.recv() => {
                    info!("Scheduler shutting down");
                    break;
                }
            }
        }
    }

    async fn sweep(&self) {
        let report = self.deliverer.deliver_due_all().await;

        if report.is_idle() {
            debug!("Sweep finished, nobody due ({} waiting)", report.not_due);
        } else {
            info!(
                "Sweep finished: {} delivered, {} failed, {} dropped, {} not due",
                report.delivered, report.failed, report.dropped, report.not_due
            );
        }
    }
}

impl<S> std::fmt::Debug for DeliveryScheduler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryScheduler")
            .field("check_interval", &self.check_interval)
            .finish_non_exhaustive()
    }
}
