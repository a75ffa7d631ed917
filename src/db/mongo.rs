//! MongoDB client and collection wrapper

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use mongodb::{
    options::{IndexOptions, UpdateModifications},
    results::UpdateResult,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info};

use crate::db::schemas::{
    NotificationDoc, TopicDoc, NOTIFICATION_COLLECTION, TOPIC_COLLECTION,
};
use crate::db::AlertStore;
use crate::types::{HeraldError, Result};

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| HeraldError::Store(format!("Failed to connect to MongoDB: {}", e)))?;

        // Verify connection with timeout
        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| HeraldError::Store(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

    /// Get the raw MongoDB client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the database name
    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
{
    /// Create a new collection and apply indexes
    pub async fn new(client: &Client, db_name: &str, collection_name: &str) -> Result<Self> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> Result<()> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| HeraldError::Store(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, returning its assigned ID
    pub async fn insert_one(&self, item: &T) -> Result<ObjectId> {
        let result = self
            .inner
            .insert_one(item)
            .await
            .map_err(|e| HeraldError::Store(format!("Insert failed: {}", e)))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| HeraldError::Store("Failed to get inserted ID".into()))
    }

    /// Find many documents by filter, with optional sort and limit
    pub async fn find_many(
        &self,
        filter: Document,
        sort: Option<Document>,
        limit: Option<i64>,
    ) -> Result<Vec<T>> {
        use futures_util::StreamExt;

        let mut find = self.inner.find(filter);
        if let Some(sort) = sort {
            find = find.sort(sort);
        }
        if let Some(limit) = limit {
            find = find.limit(limit);
        }

        let cursor = find
            .await
            .map_err(|e| HeraldError::Store(format!("Find failed: {}", e)))?;

        let results: Vec<T> = cursor
            .filter_map(|doc| async {
                match doc {
                    Ok(d) => Some(d),
                    Err(e) => {
                        error!("Error reading document: {}", e);
                        None
                    }
                }
            })
            .collect()
            .await;

        Ok(results)
    }

    /// Update one document
    pub async fn update_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult> {
        self.inner
            .update_one(filter, update.into())
            .await
            .map_err(|e| HeraldError::Store(format!("Update failed: {}", e)))
    }

    /// Update many documents
    pub async fn update_many(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult> {
        self.inner
            .update_many(filter, update.into())
            .await
            .map_err(|e| HeraldError::Store(format!("Update failed: {}", e)))
    }

    /// Get the underlying collection for advanced operations
    pub fn inner(&self) -> &Collection<T> {
        &self.inner
    }
}

/// MongoDB-backed store for topics and notifications
pub struct MongoStore {
    topics: MongoCollection<TopicDoc>,
    notifications: MongoCollection<NotificationDoc>,
}

impl MongoStore {
    /// Open the topic and notification collections
    pub async fn new(client: &MongoClient) -> Result<Self> {
        let topics = client.collection::<TopicDoc>(TOPIC_COLLECTION).await?;
        let notifications = client
            .collection::<NotificationDoc>(NOTIFICATION_COLLECTION)
            .await?;

        Ok(Self {
            topics,
            notifications,
        })
    }
}

#[async_trait]
impl AlertStore for MongoStore {
    async fn list_topics(&self) -> Result<Vec<TopicDoc>> {
        self.topics
            .find_many(doc! {}, Some(doc! { "created_at": 1 }), None)
            .await
    }

    async fn insert_topic(&self, mut topic: TopicDoc) -> Result<TopicDoc> {
        let id = self.topics.insert_one(&topic).await?;
        topic._id = Some(id);
        Ok(topic)
    }

    async fn insert_notification(&self, mut doc: NotificationDoc) -> Result<NotificationDoc> {
        let id = self.notifications.insert_one(&doc).await?;
        doc._id = Some(id);
        Ok(doc)
    }

    async fn notifications_by_type(
        &self,
        kind: &str,
        limit: i64,
    ) -> Result<Vec<NotificationDoc>> {
        self.notifications
            .find_many(
                doc! { "type": kind },
                Some(doc! { "created_at": -1 }),
                Some(limit),
            )
            .await
    }

    async fn recent_notifications(&self, limit: i64) -> Result<Vec<NotificationDoc>> {
        self.notifications
            .find_many(doc! {}, Some(doc! { "created_at": -1 }), Some(limit))
            .await
    }

    async fn set_acknowledged(&self, id: &str) -> Result<bool> {
        let oid = ObjectId::parse_str(id)
            .map_err(|e| HeraldError::Store(format!("Invalid notification id '{}': {}", id, e)))?;

        let result = self
            .notifications
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": { "acknowledged": true } },
            )
            .await?;

        Ok(result.matched_count > 0)
    }

    async fn acknowledge_all(&self) -> Result<u64> {
        let result = self
            .notifications
            .update_many(
                doc! { "acknowledged": false },
                doc! { "$set": { "acknowledged": true } },
            )
            .await?;

        Ok(result.modified_count)
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a running MongoDB instance.
    // Store contract coverage lives in db::memory against the same trait.
}
