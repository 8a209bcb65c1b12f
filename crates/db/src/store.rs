use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Document};

use crate::{error::StoreResult, filter::Filter, StoreError};

/// Shared handle to a document store, acquired once at startup.
pub type SharedStore = Arc<dyn DocumentStore>;

/// Minimal document database surface used by the service.
///
/// Documents returned by [`find`](DocumentStore::find) and
/// [`find_one`](DocumentStore::find_one) carry their internal `_id`;
/// callers are responsible for reshaping them before they leave the process.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name of the logical database backing this store.
    fn database_name(&self) -> &str;

    /// Persist `document` and return its newly assigned identifier.
    async fn insert(&self, collection: &str, document: Document) -> StoreResult<String>;

    /// Every document matching `filter`, in store order.
    async fn find(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>>;

    /// The document with identifier `id`.
    async fn find_one(&self, collection: &str, id: &str) -> StoreResult<Document>;

    /// Set `fields` on the document with identifier `id`, returning the
    /// number of matched documents (0 or 1).
    async fn update_one(&self, collection: &str, id: &str, fields: Document) -> StoreResult<u64>;

    /// Round-trip to the backend.
    async fn ping(&self) -> StoreResult<()>;

    async fn list_collections(&self) -> StoreResult<Vec<String>>;
}

/// Parse a caller supplied identifier into the store's native id type.
pub fn parse_id(id: &str) -> StoreResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_object_ids() {
        let id = ObjectId::new();
        assert_eq!(parse_id(&id.to_hex()).unwrap(), id);
    }

    #[test]
    fn rejects_malformed_ids() {
        for raw in ["", "42", "not-an-object-id", "zzzzzzzzzzzzzzzzzzzzzzzz"] {
            assert!(matches!(parse_id(raw), Err(StoreError::InvalidId(_))));
        }
    }
}
