//! Store adapter for topics and notifications
//!
//! The persistent store is an external collaborator; this module owns only
//! its contract. `MongoStore` is the production backend, `MemoryStore`
//! serves dev mode and tests.

pub mod memory;
pub mod mongo;
pub mod schemas;

pub use memory::MemoryStore;
pub use mongo::{MongoClient, MongoCollection, MongoStore};

use async_trait::async_trait;

use crate::db::schemas::{NotificationDoc, TopicDoc};
use crate::types::Result;

/// Contract for notification creation, querying, and mutation.
///
/// Notifications are never deleted through this interface; the only
/// mutation is the monotonic unread-to-acknowledged transition.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Load all topics in stable store ordering (creation order).
    async fn list_topics(&self) -> Result<Vec<TopicDoc>>;

    /// Create a topic. Returns the stored document with its assigned id.
    async fn insert_topic(&self, topic: TopicDoc) -> Result<TopicDoc>;

    /// Persist one notification. Returns the stored document with its
    /// assigned id; on failure no record exists.
    async fn insert_notification(&self, doc: NotificationDoc) -> Result<NotificationDoc>;

    /// Most recent notifications of one type, newest-first.
    async fn notifications_by_type(&self, kind: &str, limit: i64)
        -> Result<Vec<NotificationDoc>>;

    /// Most recent notifications across all types, newest-first.
    async fn recent_notifications(&self, limit: i64) -> Result<Vec<NotificationDoc>>;

    /// Set `acknowledged = true` for one notification. Returns whether a
    /// matching record existed. Idempotent.
    async fn set_acknowledged(&self, id: &str) -> Result<bool>;

    /// Set `acknowledged = true` for every unacknowledged notification.
    /// Returns the number of records updated.
    async fn acknowledge_all(&self) -> Result<u64>;
}
