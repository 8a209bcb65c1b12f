//! Error types for document store operations.

use mongodb::bson;
use thiserror::Error;

/// Errors raised by a [`DocumentStore`](crate::DocumentStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The identifier is not a 24 character hex ObjectId.
    #[error("invalid document id '{0}'")]
    InvalidId(String),

    /// No document with the given id exists in the collection.
    #[error("document {id} not found in collection {collection}")]
    NotFound { id: String, collection: String },

    /// The backend could not be reached or the operation failed there.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A document could not be converted to or from BSON.
    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<bson::ser::Error> for StoreError {
    fn from(err: bson::ser::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<bson::de::Error> for StoreError {
    fn from(err: bson::de::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
