//! Connectivity report served at `/test`.
//!
//! The report never fails as a whole: each probe that errors degrades its
//! own field and the endpoint still answers 200.

use axum::{extract::State, routing::get, Json, Router};
use bookshelf_db::{DocumentStore, SharedStore};
use serde::Serialize;

use crate::error::{truncate, MAX_DIAGNOSTIC_LEN};

/// Collections listed in the report.
const MAX_COLLECTIONS: usize = 10;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthReport {
    pub backend: String,
    pub database: String,
    pub database_url: String,
    pub database_name: Option<String>,
    pub connection_status: String,
    pub collections: Vec<String>,
}

#[derive(Clone)]
struct DiagnosticsState {
    store: SharedStore,
    database_url_set: bool,
}

/// Probe `store` and describe what was reachable.
pub async fn probe(store: &dyn DocumentStore, database_url_set: bool) -> HealthReport {
    let mut report = HealthReport {
        backend: "running".to_string(),
        database: "unavailable".to_string(),
        database_url: if database_url_set { "set" } else { "not_set" }.to_string(),
        database_name: None,
        connection_status: "not_connected".to_string(),
        collections: Vec::new(),
    };

    if let Err(err) = store.ping().await {
        report.database = format!(
            "unavailable: {}",
            truncate(&err.to_string(), MAX_DIAGNOSTIC_LEN)
        );
        return report;
    }

    report.connection_status = "connected".to_string();
    report.database_name = Some(store.database_name().to_string());

    match store.list_collections().await {
        Ok(mut names) => {
            names.truncate(MAX_COLLECTIONS);
            report.collections = names;
            report.database = "connected".to_string();
        }
        Err(err) => {
            report.database = format!(
                "connected_with_error: {}",
                truncate(&err.to_string(), MAX_DIAGNOSTIC_LEN)
            );
        }
    }

    report
}

async fn health(State(state): State<DiagnosticsState>) -> Json<HealthReport> {
    Json(probe(state.store.as_ref(), state.database_url_set).await)
}

/// Router exposing `GET /test`.
pub fn routes(store: SharedStore, database_url_set: bool) -> Router {
    Router::new()
        .route("/test", get(health))
        .with_state(DiagnosticsState {
            store,
            database_url_set,
        })
}
