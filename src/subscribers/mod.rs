//! Subscriber bookkeeping.
//!
//! Tracks, per user, when the last word was delivered and which word lists
//! the user receives, persisted as a single JSON document.

mod record;
mod store;

pub use record::{
    DOCUMENT_VERSION, ListChangeError, Subscriber, SubscriberDocument, Subscribers, UserId,
    all_have_lists,
};
pub use store::{StoreError, SubscriberStore};
