//! Server-side insert path
//!
//! Validates an inbound alert payload, resolves its topic, persists one
//! notification, and publishes the stored record to the feed. Validation
//! failures never reach the store; store failures surface with the
//! underlying message and leave no record behind.

use bson::DateTime;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::db::schemas::{NotificationDoc, NotificationRecord, Priority};
use crate::db::AlertStore;
use crate::delivery::feed::NotificationFeed;
use crate::topics::TopicResolver;
use crate::types::{HeraldError, Result};

/// Inbound alert payload: `{title, message, priority?, ...extra}`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AlertPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Everything else rides along in the notification metadata
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AlertPayload {
    /// Reject absent or empty `title`/`message`
    pub fn validate(&self) -> Result<(&str, &str)> {
        match (self.title.as_deref(), self.message.as_deref()) {
            (Some(title), Some(message)) if !title.is_empty() && !message.is_empty() => {
                Ok((title, message))
            }
            _ => Err(HeraldError::Validation(
                "Missing required fields: title and message are required".into(),
            )),
        }
    }
}

/// A successfully routed and stored notification
#[derive(Debug, Clone)]
pub struct Delivered {
    pub notification: NotificationRecord,
    /// Resolved topic name, or the raw slug when unmatched
    pub topic_label: String,
}

/// Route an inbound alert to a topic and persist it.
///
/// `endpoint_path` is the originating request path, recorded in the
/// notification metadata alongside the topic identifiers.
pub async fn ingest_topic(
    store: &Arc<dyn AlertStore>,
    resolver: &TopicResolver,
    feed: &NotificationFeed,
    slug: &str,
    endpoint_path: &str,
    payload: AlertPayload,
) -> Result<Delivered> {
    let (title, message) = payload.validate()?;

    let resolved = resolver.resolve(slug).await?;

    let mut metadata = payload.extra.clone();
    metadata.insert("topic_slug".into(), slug.into());
    metadata.insert("topic_name".into(), resolved.label.clone().into());
    metadata.insert("api_endpoint".into(), endpoint_path.into());

    let doc = NotificationDoc {
        _id: None,
        title: title.to_string(),
        body: message.to_string(),
        kind: resolved.kind.clone(),
        priority: payload.priority.unwrap_or_default(),
        metadata,
        created_at: DateTime::now(),
        acknowledged: false,
    };

    let record = insert_and_publish(store, feed, doc).await?;

    info!(
        slug = slug,
        kind = %resolved.kind,
        matched = resolved.matched,
        id = %record.id,
        "notification stored for topic"
    );

    Ok(Delivered {
        notification: record,
        topic_label: resolved.label,
    })
}

/// Persist a notification and fan its record out on the feed
pub async fn insert_and_publish(
    store: &Arc<dyn AlertStore>,
    feed: &NotificationFeed,
    doc: NotificationDoc,
) -> Result<NotificationRecord> {
    let stored = store.insert_notification(doc).await?;
    let record = stored.to_record();
    feed.publish(record.clone());
    Ok(record)
}
