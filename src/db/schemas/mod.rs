//! Document schemas for the external store
//!
//! `Doc` structs are the persisted shape; `Record` structs are the
//! JSON-facing shape returned to clients and carried on the feed.

pub mod notification;
pub mod topic;

pub use notification::{NotificationDoc, NotificationRecord, Priority, NOTIFICATION_COLLECTION};
pub use topic::{TopicDoc, TOPIC_COLLECTION};
