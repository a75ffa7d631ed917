//! Notification document schema
//!
//! Persisted shape: `notifications(id, title, body, type, priority,
//! metadata, created_at, acknowledged)`. The `type` field is a
//! denormalized, best-effort link to a topic name in snake form; a
//! notification can outlive or never match a topic.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for notifications
pub const NOTIFICATION_COLLECTION: &str = "notifications";

/// Notification priority. Order of the variants is the priority rank.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// Notification document stored in the external store
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NotificationDoc {
    /// Document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    pub title: String,

    pub body: String,

    /// Resolved topic identity in snake form, or slug-derived fallback
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub priority: Priority,

    /// Open key-value map; always includes `topic_slug` and `topic_name`
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,

    pub created_at: DateTime,

    /// Monotonic: once true it is never reset to false
    #[serde(default)]
    pub acknowledged: bool,
}

impl NotificationDoc {
    /// Convert to the JSON-facing record shape
    pub fn to_record(&self) -> NotificationRecord {
        NotificationRecord {
            id: self._id.map(|id| id.to_hex()).unwrap_or_default(),
            title: self.title.clone(),
            body: self.body.clone(),
            kind: self.kind.clone(),
            priority: self.priority,
            metadata: self.metadata.clone(),
            created_at: self
                .created_at
                .try_to_rfc3339_string()
                .unwrap_or_default(),
            acknowledged: self.acknowledged,
        }
    }
}

impl IntoIndexes for NotificationDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Topic-scoped reads are always newest-first
            (
                doc! { "type": 1, "created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("type_created_at".to_string())
                        .build(),
                ),
            ),
            // Bulk acknowledge targets the unacknowledged set
            (
                doc! { "acknowledged": 1 },
                Some(
                    IndexOptions::builder()
                        .name("acknowledged_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

/// JSON-facing notification record
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NotificationRecord {
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub created_at: String,
    #[serde(default)]
    pub acknowledged: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
        assert_eq!(
            serde_json::from_str::<Priority>("\"low\"").unwrap(),
            Priority::Low
        );
    }

    #[test]
    fn test_priority_default_is_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_priority_rank_ordering() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
    }

    #[test]
    fn test_doc_to_record() {
        let doc = NotificationDoc {
            _id: Some(ObjectId::new()),
            title: "Site Down Alert".to_string(),
            body: "example.com is not responding".to_string(),
            kind: "site_monitoring".to_string(),
            priority: Priority::High,
            metadata: serde_json::Map::new(),
            created_at: DateTime::now(),
            acknowledged: false,
        };

        let record = doc.to_record();
        assert_eq!(record.id.len(), 24);
        assert_eq!(record.kind, "site_monitoring");
        assert!(!record.acknowledged);
        assert!(record.created_at.contains('T'));
    }

    #[test]
    fn test_record_serializes_type_field() {
        let record = NotificationRecord {
            id: "abc".to_string(),
            title: "t".to_string(),
            body: "b".to_string(),
            kind: "custom_thing".to_string(),
            priority: Priority::Medium,
            metadata: serde_json::Map::new(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            acknowledged: false,
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"type\":\"custom_thing\""));
        assert!(json.contains("\"priority\":\"medium\""));
    }
}
