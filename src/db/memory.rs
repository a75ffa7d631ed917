//! In-memory store
//!
//! Backs dev mode when MongoDB is unreachable, and the route/tracker tests.
//! Insertion order is the stable store ordering.

use async_trait::async_trait;
use bson::oid::ObjectId;
use std::sync::Mutex;

use crate::db::schemas::{NotificationDoc, TopicDoc};
use crate::db::AlertStore;
use crate::types::Result;

/// In-memory implementation of [`AlertStore`]
#[derive(Default)]
pub struct MemoryStore {
    topics: Mutex<Vec<TopicDoc>>,
    notifications: Mutex<Vec<NotificationDoc>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored notifications
    pub fn notification_count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn list_topics(&self) -> Result<Vec<TopicDoc>> {
        Ok(self.topics.lock().unwrap().clone())
    }

    async fn insert_topic(&self, mut topic: TopicDoc) -> Result<TopicDoc> {
        if topic._id.is_none() {
            topic._id = Some(ObjectId::new());
        }
        self.topics.lock().unwrap().push(topic.clone());
        Ok(topic)
    }

    async fn insert_notification(&self, mut doc: NotificationDoc) -> Result<NotificationDoc> {
        if doc._id.is_none() {
            doc._id = Some(ObjectId::new());
        }
        self.notifications.lock().unwrap().push(doc.clone());
        Ok(doc)
    }

    async fn notifications_by_type(
        &self,
        kind: &str,
        limit: i64,
    ) -> Result<Vec<NotificationDoc>> {
        let list = self.notifications.lock().unwrap();
        let mut items: Vec<NotificationDoc> = list
            .iter()
            .rev()
            .filter(|n| n.kind == kind)
            .cloned()
            .collect();
        // Stable sort; the reversed iteration keeps newest-insertion-first
        // for equal timestamps
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(limit as usize);
        Ok(items)
    }

    async fn recent_notifications(&self, limit: i64) -> Result<Vec<NotificationDoc>> {
        let list = self.notifications.lock().unwrap();
        let mut items: Vec<NotificationDoc> = list.iter().rev().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(limit as usize);
        Ok(items)
    }

    async fn set_acknowledged(&self, id: &str) -> Result<bool> {
        let mut list = self.notifications.lock().unwrap();
        for n in list.iter_mut() {
            if n._id.map(|oid| oid.to_hex()).as_deref() == Some(id) {
                n.acknowledged = true;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn acknowledge_all(&self) -> Result<u64> {
        let mut list = self.notifications.lock().unwrap();
        let mut updated = 0u64;
        for n in list.iter_mut() {
            if !n.acknowledged {
                n.acknowledged = true;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::Priority;
    use bson::DateTime;

    fn make_doc(kind: &str, millis: i64) -> NotificationDoc {
        NotificationDoc {
            _id: None,
            title: format!("{} alert", kind),
            body: "body".to_string(),
            kind: kind.to_string(),
            priority: Priority::Medium,
            metadata: serde_json::Map::new(),
            created_at: DateTime::from_millis(millis),
            acknowledged: false,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_id() {
        let store = MemoryStore::new();
        let stored = store
            .insert_notification(make_doc("site_monitoring", 1_000))
            .await
            .unwrap();
        assert!(stored._id.is_some());
        assert_eq!(store.notification_count(), 1);
    }

    #[tokio::test]
    async fn test_by_type_newest_first_with_limit() {
        let store = MemoryStore::new();
        for i in 0..4 {
            store
                .insert_notification(make_doc("site_monitoring", 1_000 + i))
                .await
                .unwrap();
        }
        store
            .insert_notification(make_doc("other_topic", 9_999))
            .await
            .unwrap();

        let items = store
            .notifications_by_type("site_monitoring", 3)
            .await
            .unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].created_at, DateTime::from_millis(1_003));
        assert_eq!(items[2].created_at, DateTime::from_millis(1_001));
    }

    #[tokio::test]
    async fn test_set_acknowledged_is_idempotent() {
        let store = MemoryStore::new();
        let stored = store
            .insert_notification(make_doc("alerts", 1))
            .await
            .unwrap();
        let id = stored._id.unwrap().to_hex();

        assert!(store.set_acknowledged(&id).await.unwrap());
        assert!(store.set_acknowledged(&id).await.unwrap());
        assert!(!store.set_acknowledged("unknown-id").await.unwrap());

        let items = store.recent_notifications(10).await.unwrap();
        assert!(items[0].acknowledged);
    }

    #[tokio::test]
    async fn test_acknowledge_all_counts_only_unread() {
        let store = MemoryStore::new();
        for i in 0..3 {
            store.insert_notification(make_doc("alerts", i)).await.unwrap();
        }
        assert_eq!(store.acknowledge_all().await.unwrap(), 3);
        assert_eq!(store.acknowledge_all().await.unwrap(), 0);
    }
}
