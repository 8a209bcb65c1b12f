//! In-memory backend for local development and tests.
//!
//! Documents live in per-collection vectors behind an async read-write lock,
//! so insertion order doubles as store order. Clones share the same data.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Document};
use tokio::sync::RwLock;

use crate::{
    error::{StoreError, StoreResult},
    filter::Filter,
    store::{parse_id, DocumentStore},
};

type CollectionMap = HashMap<String, Vec<Document>>;

#[derive(Debug, Clone)]
pub struct InMemoryStore {
    database: String,
    collections: Arc<RwLock<CollectionMap>>,
}

impl InMemoryStore {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collections: Arc::new(RwLock::new(CollectionMap::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

fn has_id(document: &Document, id: &ObjectId) -> bool {
    document.get_object_id("_id").is_ok_and(|stored| stored == *id)
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn insert(&self, collection: &str, document: Document) -> StoreResult<String> {
        let id = ObjectId::new();

        let mut stored = Document::new();
        stored.insert("_id", id);
        for (key, value) in document {
            if key != "_id" {
                stored.insert(key, value);
            }
        }

        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(stored);

        Ok(id.to_hex())
    }

    async fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;

        Ok(collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| filter.matches(document))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_one(&self, collection: &str, id: &str) -> StoreResult<Document> {
        let object_id = parse_id(id)?;
        let collections = self.collections.read().await;

        collections
            .get(collection)
            .and_then(|documents| documents.iter().find(|document| has_id(document, &object_id)))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                id: id.to_string(),
                collection: collection.to_string(),
            })
    }

    async fn update_one(&self, collection: &str, id: &str, fields: Document) -> StoreResult<u64> {
        let object_id = parse_id(id)?;
        let mut collections = self.collections.write().await;

        let Some(document) = collections
            .get_mut(collection)
            .and_then(|documents| documents.iter_mut().find(|document| has_id(document, &object_id)))
        else {
            return Ok(0);
        };

        for (key, value) in fields {
            if key != "_id" {
                document.insert(key, value);
            }
        }

        Ok(1)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn list_collections(&self) -> StoreResult<Vec<String>> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[tokio::test]
    async fn insert_assigns_object_id() {
        let store = InMemoryStore::default();
        let id = store
            .insert("book", doc! { "title": "Dune" })
            .await
            .unwrap();

        let stored = store.find_one("book", &id).await.unwrap();
        assert_eq!(stored.get_object_id("_id").unwrap().to_hex(), id);
        assert_eq!(stored.get_str("title").unwrap(), "Dune");
    }

    #[tokio::test]
    async fn caller_supplied_id_is_ignored() {
        let store = InMemoryStore::default();
        let forged = ObjectId::new();
        let id = store
            .insert("book", doc! { "_id": forged, "title": "Dune" })
            .await
            .unwrap();

        assert_ne!(id, forged.to_hex());
        assert!(matches!(
            store.find_one("book", &forged.to_hex()).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn find_applies_filter_in_insertion_order() {
        let store = InMemoryStore::default();
        store.insert("book", doc! { "genre": "SciFi", "n": 1 }).await.unwrap();
        store.insert("book", doc! { "genre": "Fantasy", "n": 2 }).await.unwrap();
        store.insert("book", doc! { "genre": "SciFi", "n": 3 }).await.unwrap();

        let found = store
            .find("book", &Filter::eq("genre", "SciFi"))
            .await
            .unwrap();
        let order: Vec<i32> = found.iter().map(|d| d.get_i32("n").unwrap()).collect();
        assert_eq!(order, vec![1, 3]);

        assert!(store.find("other", &Filter::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let store = InMemoryStore::default();
        let id = store
            .insert("book", doc! { "title": "Dune", "genre": "SciFi" })
            .await
            .unwrap();

        let matched = store
            .update_one("book", &id, doc! { "genre": "Fantasy" })
            .await
            .unwrap();
        assert_eq!(matched, 1);

        let stored = store.find_one("book", &id).await.unwrap();
        assert_eq!(stored.get_str("title").unwrap(), "Dune");
        assert_eq!(stored.get_str("genre").unwrap(), "Fantasy");
    }

    #[tokio::test]
    async fn update_of_unknown_id_matches_nothing() {
        let store = InMemoryStore::default();
        let matched = store
            .update_one("book", &ObjectId::new().to_hex(), doc! { "genre": "Fantasy" })
            .await
            .unwrap();
        assert_eq!(matched, 0);
    }

    #[tokio::test]
    async fn malformed_ids_are_rejected() {
        let store = InMemoryStore::default();
        assert!(matches!(
            store.find_one("book", "nope").await,
            Err(StoreError::InvalidId(_))
        ));
        assert!(matches!(
            store.update_one("book", "nope", doc! {}).await,
            Err(StoreError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn lists_collections_sorted() {
        let store = InMemoryStore::new("library");
        store.insert("book", doc! {}).await.unwrap();
        store.insert("author", doc! {}).await.unwrap();

        assert_eq!(store.list_collections().await.unwrap(), vec!["author", "book"]);
        assert_eq!(store.database_name(), "library");
        store.ping().await.unwrap();
    }
}
