//! Topic identity and slug routing
//!
//! An inbound request addresses a topic by slug. The resolver matches the
//! slug against stored topic names through a normalized-key index with
//! deterministic first-match semantics; an unmatched slug resolves to a
//! synthetic identity derived from the slug itself.

use std::sync::Arc;

use crate::db::schemas::TopicDoc;
use crate::db::AlertStore;
use crate::types::{HeraldError, Result};

/// Derive the URL-safe slug for a topic name.
///
/// Lowercase, runs of non-alphanumeric characters collapsed to a single
/// `-`, leading/trailing `-` trimmed. Pure function of the name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Normalize a topic name for matching: lowercase, whitespace runs
/// collapsed to a single space, trimmed.
fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Snake-form type key for a matched topic name
fn kind_from_name(name: &str) -> String {
    normalize_name(name).replace(' ', "_")
}

/// Snake-form type key for an unmatched slug
pub fn kind_from_slug(slug: &str) -> String {
    slug.replace('-', "_")
}

/// Outcome of resolving an inbound slug
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTopic {
    /// Type stored on the notification, in snake form
    pub kind: String,
    /// Display label: the matched topic name, or the raw slug
    pub label: String,
    /// Whether a stored topic matched
    pub matched: bool,
}

/// Normalized-key lookup index over a loaded topic set.
///
/// Built once per topic load; lookups are substring matches against the
/// normalized names, first match in store ordering wins.
pub struct TopicIndex {
    entries: Vec<(String, String)>,
}

impl TopicIndex {
    /// Build the index from topics in stable store ordering
    pub fn build(topics: &[TopicDoc]) -> Self {
        let entries = topics
            .iter()
            .map(|t| (normalize_name(&t.name), t.name.clone()))
            .collect();
        Self { entries }
    }

    /// Resolve a slug to a topic identity.
    ///
    /// The needle is the slug with dashes substituted by spaces; a topic
    /// matches when its normalized name contains the needle. No match
    /// resolves to the slug itself.
    pub fn resolve(&self, slug: &str) -> ResolvedTopic {
        let needle = slug.replace('-', " ").to_lowercase();

        for (normalized, name) in &self.entries {
            if normalized.contains(&needle) {
                return ResolvedTopic {
                    kind: kind_from_name(name),
                    label: name.clone(),
                    matched: true,
                };
            }
        }

        ResolvedTopic {
            kind: kind_from_slug(slug),
            label: slug.to_string(),
            matched: false,
        }
    }
}

/// Resolves inbound slugs against the stored topic set
pub struct TopicResolver {
    store: Arc<dyn AlertStore>,
}

impl TopicResolver {
    pub fn new(store: Arc<dyn AlertStore>) -> Self {
        Self { store }
    }

    /// Load topics and resolve the slug.
    ///
    /// A store failure here is a hard resolution error, distinct from an
    /// empty lookup result (which falls back to the slug identity).
    pub async fn resolve(&self, slug: &str) -> Result<ResolvedTopic> {
        let topics = self.store.list_topics().await.map_err(|e| match e {
            HeraldError::Store(msg) => HeraldError::Resolution(msg),
            other => other,
        })?;

        Ok(TopicIndex::build(&topics).resolve(slug))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(name: &str) -> TopicDoc {
        TopicDoc::new(name, "", "http://localhost:8080")
    }

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Site Monitoring"), "site-monitoring");
        assert_eq!(slugify("Server  Alerts!"), "server-alerts");
        assert_eq!(slugify("  CPU / Memory  "), "cpu-memory");
    }

    #[test]
    fn test_slugify_collapses_symbol_runs() {
        assert_eq!(slugify("a---b___c"), "a-b-c");
        assert_eq!(slugify("!!alerts!!"), "alerts");
    }

    #[test]
    fn test_slugify_idempotent() {
        for name in ["Site Monitoring", "a---b", "Disk 90% Full", "already-a-slug"] {
            let slug = slugify(name);
            assert_eq!(slugify(&slug), slug, "slug of slug differs for {:?}", name);
        }
    }

    #[test]
    fn test_resolve_exact_and_substring_match() {
        let topics = vec![topic("Site Monitoring"), topic("Database Alerts")];
        let index = TopicIndex::build(&topics);

        let resolved = index.resolve("site-monitoring");
        assert!(resolved.matched);
        assert_eq!(resolved.kind, "site_monitoring");
        assert_eq!(resolved.label, "Site Monitoring");

        // Partial slug still matches by substring
        let resolved = index.resolve("monitoring");
        assert!(resolved.matched);
        assert_eq!(resolved.label, "Site Monitoring");
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let topics = vec![topic("Site MONITORING")];
        let resolved = TopicIndex::build(&topics).resolve("site-monitoring");
        assert!(resolved.matched);
        assert_eq!(resolved.kind, "site_monitoring");
    }

    #[test]
    fn test_resolve_first_match_is_deterministic() {
        let topics = vec![topic("Alerts Primary"), topic("Alerts Secondary")];
        let index = TopicIndex::build(&topics);

        let resolved = index.resolve("alerts");
        assert_eq!(resolved.label, "Alerts Primary");
    }

    #[test]
    fn test_resolve_unmatched_falls_back_to_slug() {
        let index = TopicIndex::build(&[]);
        let resolved = index.resolve("custom-thing");
        assert!(!resolved.matched);
        assert_eq!(resolved.kind, "custom_thing");
        assert_eq!(resolved.label, "custom-thing");
    }

    #[tokio::test]
    async fn test_resolver_store_failure_propagates() {
        use crate::db::schemas::NotificationDoc;
        use async_trait::async_trait;

        struct DownStore;

        #[async_trait]
        impl AlertStore for DownStore {
            async fn list_topics(&self) -> crate::types::Result<Vec<TopicDoc>> {
                Err(HeraldError::Store("connection refused".into()))
            }
            async fn insert_topic(&self, _t: TopicDoc) -> crate::types::Result<TopicDoc> {
                unreachable!()
            }
            async fn insert_notification(
                &self,
                _d: NotificationDoc,
            ) -> crate::types::Result<NotificationDoc> {
                unreachable!()
            }
            async fn notifications_by_type(
                &self,
                _k: &str,
                _l: i64,
            ) -> crate::types::Result<Vec<NotificationDoc>> {
                unreachable!()
            }
            async fn recent_notifications(
                &self,
                _l: i64,
            ) -> crate::types::Result<Vec<NotificationDoc>> {
                unreachable!()
            }
            async fn set_acknowledged(&self, _id: &str) -> crate::types::Result<bool> {
                unreachable!()
            }
            async fn acknowledge_all(&self) -> crate::types::Result<u64> {
                unreachable!()
            }
        }

        let resolver = TopicResolver::new(Arc::new(DownStore));
        let err = resolver.resolve("site-monitoring").await.unwrap_err();
        assert!(matches!(err, HeraldError::Resolution(_)));
    }
}
