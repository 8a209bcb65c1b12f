//! MongoDB backend.

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    options::ClientOptions,
    Client, Collection, Database,
};

use crate::{
    error::{StoreError, StoreResult},
    filter::Filter,
    store::{parse_id, DocumentStore},
};

#[derive(Debug, Clone)]
pub struct MongoStore {
    client: Client,
    database: String,
    operation_timeout: Duration,
}

impl MongoStore {
    pub fn new(client: Client, database: impl Into<String>, operation_timeout: Duration) -> Self {
        Self {
            client,
            database: database.into(),
            operation_timeout,
        }
    }

    /// Build a client for `url`. No round-trip happens until the first operation.
    pub async fn connect(
        url: &str,
        database: &str,
        operation_timeout: Duration,
    ) -> StoreResult<Self> {
        let mut options = ClientOptions::parse(url).await?;
        options.app_name = Some("bookshelf".to_string());
        options.server_selection_timeout = Some(operation_timeout);
        options.connect_timeout = Some(operation_timeout);

        let client = Client::with_options(options)?;

        tracing::info!(database, "mongodb client configured");

        Ok(Self::new(client, database, operation_timeout))
    }

    fn db(&self) -> Database {
        self.client.database(&self.database)
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db().collection(name)
    }

    /// Run `operation` under the configured deadline.
    async fn bounded<T, F>(&self, operation: F) -> StoreResult<T>
    where
        F: Future<Output = mongodb::error::Result<T>>,
    {
        match tokio::time::timeout(self.operation_timeout, operation).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Unavailable(format!(
                "operation timed out after {}ms",
                self.operation_timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn insert(&self, collection: &str, document: Document) -> StoreResult<String> {
        let collection = self.collection(collection);
        let result = self
            .bounded(async { collection.insert_one(document).await })
            .await?;

        Ok(match result.inserted_id {
            Bson::ObjectId(id) => id.to_hex(),
            other => other.to_string(),
        })
    }

    async fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        let collection = self.collection(collection);
        let query = filter.to_document();

        tracing::debug!(?query, "mongodb find");

        self.bounded(async {
            collection
                .find(query)
                .await?
                .try_collect::<Vec<Document>>()
                .await
        })
        .await
    }

    async fn find_one(&self, collection: &str, id: &str) -> StoreResult<Document> {
        let object_id = parse_id(id)?;
        let handle = self.collection(collection);

        self.bounded(async { handle.find_one(doc! { "_id": object_id }).await })
            .await?
            .ok_or_else(|| StoreError::NotFound {
                id: id.to_string(),
                collection: collection.to_string(),
            })
    }

    async fn update_one(&self, collection: &str, id: &str, fields: Document) -> StoreResult<u64> {
        let object_id = parse_id(id)?;
        let collection = self.collection(collection);

        let result = self
            .bounded(async {
                collection
                    .update_one(doc! { "_id": object_id }, doc! { "$set": fields })
                    .await
            })
            .await?;

        Ok(result.matched_count)
    }

    async fn ping(&self) -> StoreResult<()> {
        let db = self.db();
        self.bounded(async { db.run_command(doc! { "ping": 1 }).await })
            .await?;
        Ok(())
    }

    async fn list_collections(&self) -> StoreResult<Vec<String>> {
        let db = self.db();
        self.bounded(async { db.list_collection_names().await })
            .await
    }
}
