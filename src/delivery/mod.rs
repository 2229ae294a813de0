//! Word delivery: the due-time policy, per-user delivery, and the
//! periodic sweep over all subscribers.

mod deliverer;
mod policy;
mod scheduler;

pub use deliverer::{Deliverer, DeliveryOutcome, SweepReport};
pub use policy::DeliveryPolicy;
pub use scheduler::{DeliveryScheduler, SchedulerMessage};
