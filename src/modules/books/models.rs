use bookshelf_db::{
    bson::{self, Bson, DateTime, Document},
    StoreError, StoreResult,
};
use serde::{Deserialize, Serialize};

/// Collection holding every book document.
pub const COLLECTION: &str = "book";

/// A book as returned to API callers.
///
/// The store's `_id` is exposed only as the hex string `id`; optional fields
/// that were never set are omitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    /// Unique identifier for the book
    pub id: String,
    pub title: String,
    pub author: String,
    /// Primary genre/category
    pub genre: String,
    /// Short description or blurb
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    /// Readable text content or excerpt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Direct URL to the audio summary (mp3, wav, etc.)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_summary_url: Option<String>,
    /// Additional tags for search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// RFC 3339 timestamp of the last partial update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Persisted shape of a book, minus its `_id`.
///
/// Missing text fields read as empty. A field of the wrong type fails the
/// decode; listings skip such documents.
#[derive(Debug, Deserialize)]
struct StoredBook {
    #[serde(default)]
    title: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    genre: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    cover_url: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    audio_summary_url: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    updated_at: Option<DateTime>,
}

impl Book {
    /// Reshape a raw store document for transport.
    pub fn from_document(mut document: Document) -> StoreResult<Self> {
        let id = match document.remove("_id") {
            Some(Bson::ObjectId(id)) => id.to_hex(),
            Some(Bson::String(id)) => id,
            Some(other) => {
                return Err(StoreError::Serialization(format!(
                    "unsupported _id type {:?}",
                    other.element_type()
                )))
            }
            None => {
                return Err(StoreError::Serialization(
                    "document has no _id".to_string(),
                ))
            }
        };

        let stored: StoredBook = bson::from_document(document)?;

        let updated_at = stored
            .updated_at
            .map(|at| at.try_to_rfc3339_string())
            .transpose()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        Ok(Self {
            id,
            title: stored.title,
            author: stored.author,
            genre: stored.genre,
            description: stored.description,
            cover_url: stored.cover_url,
            content: stored.content,
            audio_summary_url: stored.audio_summary_url,
            tags: stored.tags,
            updated_at,
        })
    }
}

/// Request body accepted by create and update.
///
/// Only the fields listed here are read; anything else in the payload is
/// ignored. `null` and absence are equivalent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookPayload {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub content: Option<String>,
    pub audio_summary_url: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// A validated book ready to be inserted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_summary_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl NewBook {
    pub fn to_document(&self) -> StoreResult<Document> {
        Ok(bson::to_document(self)?)
    }
}

/// A validated partial update. Only `Some` fields are written.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BookPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_summary_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl BookPatch {
    /// True when no field was supplied.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `$set` body for this patch, stamped with `updated_at`.
    pub fn into_document(self, updated_at: DateTime) -> StoreResult<Document> {
        let mut fields = bson::to_document(&self)?;
        fields.insert("updated_at", updated_at);
        Ok(fields)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Created {
    pub id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Acknowledged {
    pub message: String,
}

impl Acknowledged {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookList {
    pub items: Vec<Book>,
}
