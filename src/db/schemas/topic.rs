//! Topic document schema
//!
//! A topic is a named notification channel. Its slug and API endpoint are
//! pure functions of the name; the stored `api_endpoint` is a cache, never
//! authoritative.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::topics::slugify;

/// Collection name for topics
pub const TOPIC_COLLECTION: &str = "topics";

/// Topic document stored in the external store
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TopicDoc {
    /// Document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Display name, also the fuzzy matching key for inbound slugs
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Gates whether new deliveries are accepted
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Client-local interest flag
    #[serde(default)]
    pub subscribed: bool,

    /// Cached `{base_url}/api/topics/{slug}` for copy-paste integration
    #[serde(default)]
    pub api_endpoint: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime>,

    pub created_at: DateTime,
}

fn default_true() -> bool {
    true
}

impl TopicDoc {
    /// Create a new topic, deriving the cached API endpoint from the name
    pub fn new(name: impl Into<String>, description: impl Into<String>, base_url: &str) -> Self {
        let name = name.into();
        let api_endpoint = format!("{}/api/topics/{}", base_url, slugify(&name));
        Self {
            _id: None,
            name,
            description: description.into(),
            enabled: true,
            subscribed: true,
            api_endpoint,
            last_checked: None,
            created_at: DateTime::now(),
        }
    }

    /// URL-safe slug derived from the name
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

impl IntoIndexes for TopicDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "name": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("name_unique".to_string())
                        .build(),
                ),
            ),
            // Resolver loads topics in creation order
            (
                doc! { "created_at": 1 },
                Some(
                    IndexOptions::builder()
                        .name("created_at_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}
