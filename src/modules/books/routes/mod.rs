//! HTTP handlers for the books resource.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use bookshelf_db::{bson::DateTime, parse_id, SharedStore};
use bookshelf_http::error::AppError;
use serde::Deserialize;
use serde_json::json;

use super::{
    models::{Acknowledged, Book, BookList, BookPayload, Created, COLLECTION},
    query::build_filter,
    validation::{validate_create, validate_update, ValidationErrors},
};

#[derive(Clone)]
pub struct BooksState {
    pub store: SharedStore,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub genre: Option<String>,
    /// Free-text search over title, author and tags
    pub q: Option<String>,
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let message = format!("invalid book: {}", errors);
        let details = errors
            .0
            .into_iter()
            .map(|e| json!({ "field": e.field, "error": e.error }))
            .collect();
        AppError::validation(details, message)
    }
}

/// Malformed JSON or wrongly typed fields.
fn invalid_body(rejection: JsonRejection) -> AppError {
    AppError::validation(
        vec![json!({ "error": rejection.body_text() })],
        "request body is not a valid book payload",
    )
}

/// Unparseable list parameters, e.g. a repeated `genre`.
fn invalid_query(rejection: QueryRejection) -> AppError {
    AppError::validation(
        vec![json!({ "error": rejection.body_text() })],
        "query string is not a valid book listing filter",
    )
}

/// Routes mounted under `/api/books`.
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/{id}", get(get_book).patch(update_book))
        .with_state(BooksState { store })
}

async fn create_book(
    State(state): State<BooksState>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<Json<Created>, AppError> {
    let Json(payload) = payload.map_err(invalid_body)?;
    let book = validate_create(payload)?;

    let id = state.store.insert(COLLECTION, book.to_document()?).await?;
    tracing::info!(book_id = %id, genre = %book.genre, "book created");

    Ok(Json(Created {
        id,
        message: "Book created".to_string(),
    }))
}

async fn list_books(
    State(state): State<BooksState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<BookList>, AppError> {
    let Query(params) = params.map_err(invalid_query)?;
    let filter = build_filter(params.genre.as_deref(), params.q.as_deref());

    let documents = state.store.find(COLLECTION, &filter).await?;
    let mut items = Vec::with_capacity(documents.len());
    for document in documents {
        match Book::from_document(document) {
            Ok(book) => items.push(book),
            // Malformed records are logged and left out.
            Err(err) => tracing::warn!(error = %err, "skipping undecodable book document"),
        }
    }

    tracing::debug!(count = items.len(), "books listed");

    Ok(Json(BookList { items }))
}

async fn get_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    parse_id(&id)?;

    let document = state.store.find_one(COLLECTION, &id).await?;

    Ok(Json(Book::from_document(document)?))
}

async fn update_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<Json<Acknowledged>, AppError> {
    parse_id(&id)?;

    let Json(payload) = payload.map_err(invalid_body)?;
    let patch = validate_update(payload)?;

    if patch.is_empty() {
        return Ok(Json(Acknowledged::new("Nothing to update")));
    }

    let fields = patch.into_document(DateTime::now())?;
    let matched = state.store.update_one(COLLECTION, &id, fields).await?;

    if matched == 0 {
        return Err(AppError::not_found("Book not found"));
    }

    tracing::info!(book_id = %id, "book updated");

    Ok(Json(Acknowledged::new("Book updated")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        extract::Request,
        http::{header, Method, StatusCode},
    };
    use bookshelf_db::{
        bson::{doc, oid::ObjectId, Document},
        DocumentStore, Filter, InMemoryStore, StoreError, StoreResult,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Store whose backend is unreachable.
    struct DownStore;

    #[async_trait]
    impl DocumentStore for DownStore {
        fn database_name(&self) -> &str {
            "down"
        }

        async fn insert(&self, _: &str, _: Document) -> StoreResult<String> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn find(&self, _: &str, _: &Filter) -> StoreResult<Vec<Document>> {
            Err(StoreError::Unavailable(
                "server selection timeout: no available servers, topology unknown".into(),
            ))
        }

        async fn find_one(&self, _: &str, _: &str) -> StoreResult<Document> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn update_one(&self, _: &str, _: &str, _: Document) -> StoreResult<u64> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn ping(&self) -> StoreResult<()> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn list_collections(&self) -> StoreResult<Vec<String>> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    async fn send(
        router: &Router,
        method: Method,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        let response = router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn memory_router() -> (Router, InMemoryStore) {
        let store = InMemoryStore::default();
        (router(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn create_rejects_missing_fields() {
        let (router, store) = memory_router();

        let (status, body) = send(&router, Method::POST, "/", Some(r#"{"title":"Dune"}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation_error");
        assert_eq!(body["error"]["details"][0]["field"], "author");
        assert_eq!(body["error"]["details"][1]["field"], "genre");
        assert!(store.list_collections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_malformed_url_before_storage() {
        let (router, store) = memory_router();

        let (status, body) = send(
            &router,
            Method::POST,
            "/",
            Some(r#"{"title":"Dune","author":"Herbert","genre":"SciFi","cover_url":"cover.png"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"][0]["field"], "cover_url");
        assert!(store.find(COLLECTION, &Filter::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn wrongly_typed_body_is_a_validation_error() {
        let (router, _) = memory_router();

        let (status, body) = send(
            &router,
            Method::POST,
            "/",
            Some(r#"{"title":"Dune","author":"Herbert","genre":"SciFi","tags":"desert"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation_error");

        let (status, _) = send(&router, Method::POST, "/", Some("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn repeated_query_parameter_is_a_validation_error() {
        let (router, _) = memory_router();

        let (status, body) = send(&router, Method::GET, "/?genre=a&genre=b", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation_error");
        assert!(body["error"]["trace_id"].is_string());
        assert!(body["error"]["details"][0]["error"].is_string());
    }

    #[tokio::test]
    async fn mistyped_legacy_document_is_skipped_in_listing() {
        let (router, store) = memory_router();
        store
            .insert(
                COLLECTION,
                doc! { "title": "Legacy", "author": "Someone", "genre": "SciFi", "tags": "not-an-array" },
            )
            .await
            .unwrap();
        send(
            &router,
            Method::POST,
            "/",
            Some(r#"{"title":"Dune","author":"Herbert","genre":"SciFi"}"#),
        )
        .await;

        let (status, body) = send(&router, Method::GET, "/", None).await;

        assert_eq!(status, StatusCode::OK);
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "Dune");
    }

    #[tokio::test]
    async fn mistyped_document_fetched_by_id_is_an_internal_error() {
        let (router, store) = memory_router();
        let id = store
            .insert(
                COLLECTION,
                doc! { "title": "Legacy", "author": "Someone", "genre": "SciFi", "tags": "not-an-array" },
            )
            .await
            .unwrap();

        let (status, body) = send(&router, Method::GET, &format!("/{id}"), None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "internal_error");
    }

    #[tokio::test]
    async fn get_rejects_malformed_id() {
        let (router, _) = memory_router();

        let (status, body) = send(&router, Method::GET, "/not-an-id", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_id");
    }

    #[tokio::test]
    async fn patch_rejects_malformed_id() {
        let (router, _) = memory_router();

        let (status, body) =
            send(&router, Method::PATCH, "/12345", Some(r#"{"genre":"Fantasy"}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_id");
    }

    #[tokio::test]
    async fn empty_patch_is_a_no_op() {
        let (router, store) = memory_router();
        let (_, created) = send(
            &router,
            Method::POST,
            "/",
            Some(r#"{"title":"Dune","author":"Herbert","genre":"SciFi"}"#),
        )
        .await;
        let id = created["id"].as_str().unwrap().to_string();
        let before = store.find_one(COLLECTION, &id).await.unwrap();

        let (status, body) = send(
            &router,
            Method::PATCH,
            &format!("/{id}"),
            Some(r#"{"title":null,"shelf":"B2"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Nothing to update");
        assert_eq!(store.find_one(COLLECTION, &id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn empty_patch_of_unknown_id_is_still_a_no_op() {
        let (router, _) = memory_router();

        let (status, body) = send(
            &router,
            Method::PATCH,
            &format!("/{}", ObjectId::new().to_hex()),
            Some("{}"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Nothing to update");
    }

    #[tokio::test]
    async fn patch_rejects_blank_title() {
        let (router, _) = memory_router();

        let (status, body) = send(
            &router,
            Method::PATCH,
            &format!("/{}", ObjectId::new().to_hex()),
            Some(r#"{"title":"  "}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"][0]["field"], "title");
    }

    #[tokio::test]
    async fn storage_failure_is_a_truncated_server_error() {
        let router = router(Arc::new(DownStore));

        let (status, body) = send(&router, Method::GET, "/", None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "storage_unavailable");
        let message = body["error"]["message"].as_str().unwrap();
        assert!(message.chars().count() <= bookshelf_http::error::MAX_DIAGNOSTIC_LEN);
        assert!(message.starts_with("server selection timeout"));
    }

    #[tokio::test]
    async fn storage_failure_on_create_is_a_server_error() {
        let router = router(Arc::new(DownStore));

        let (status, _) = send(
            &router,
            Method::POST,
            "/",
            Some(r#"{"title":"Dune","author":"Herbert","genre":"SciFi"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
