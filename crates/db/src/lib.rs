//! Document store adapter for the bookshelf service.
//!
//! The [`DocumentStore`] trait is the only surface the HTTP layer sees. Two
//! backends implement it: [`MongoStore`] for real deployments and
//! [`InMemoryStore`] for local development and tests.

use std::{sync::Arc, time::Duration};

use serde::Deserialize;

pub mod error;
pub mod filter;
pub mod memory;
pub mod mongo;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use filter::Filter;
pub use memory::InMemoryStore;
pub use mongo::MongoStore;
pub use mongodb::bson;
pub use store::{parse_id, DocumentStore, SharedStore};

/// Which backend to construct at startup.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Mongodb,
    Memory,
}

/// Everything needed to open a store.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub backend: Backend,
    pub url: String,
    pub database: String,
    pub operation_timeout: Duration,
}

/// Open the configured store and return a shareable handle.
pub async fn connect(options: &ConnectOptions) -> StoreResult<SharedStore> {
    let store: SharedStore = match options.backend {
        Backend::Mongodb => Arc::new(
            MongoStore::connect(&options.url, &options.database, options.operation_timeout)
                .await?,
        ),
        Backend::Memory => {
            tracing::warn!(
                database = %options.database,
                "using in-memory document store; data will not survive a restart"
            );
            Arc::new(InMemoryStore::new(options.database.clone()))
        }
    };

    Ok(store)
}
