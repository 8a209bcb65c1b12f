pub mod models;
pub mod query;
pub mod routes;
pub mod validation;

use async_trait::async_trait;
use axum::Router;
use bookshelf_db::SharedStore;
use bookshelf_kernel::{InitCtx, Module};
use serde_json::json;

/// Books resource: create, list, get and partially update books
pub struct BooksModule {
    store: SharedStore,
}

impl BooksModule {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            database = ctx.store.database_name(),
            collection = models::COLLECTION,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let id_parameter = json!({
            "name": "id",
            "in": "path",
            "required": true,
            "description": "24 character hex identifier",
            "schema": { "type": "string" }
        });
        let book_fields = json!({
            "title": { "type": "string", "description": "Book title" },
            "author": { "type": "string", "description": "Author name" },
            "genre": { "type": "string", "description": "Primary genre/category" },
            "description": { "type": "string", "description": "Short description or blurb" },
            "cover_url": { "type": "string", "format": "uri", "description": "Image URL for the cover" },
            "content": { "type": "string", "description": "Readable text content or excerpt" },
            "audio_summary_url": { "type": "string", "format": "uri", "description": "Direct URL to the audio summary" },
            "tags": { "type": "array", "items": { "type": "string" }, "description": "Additional tags for search" }
        });

        let mut book_properties = book_fields.clone();
        book_properties["id"] = json!({ "type": "string", "description": "Unique identifier for the book" });
        book_properties["updated_at"] = json!({ "type": "string", "format": "date-time" });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "parameters": [
                            { "name": "genre", "in": "query", "required": false, "schema": { "type": "string" }, "description": "Exact genre match" },
                            { "name": "q", "in": "query", "required": false, "schema": { "type": "string" }, "description": "Case-insensitive search over title, author and tags" }
                        ],
                        "responses": {
                            "200": {
                                "description": "Matching books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "items": {
                                                    "type": "array",
                                                    "items": { "$ref": "#/components/schemas/Book" }
                                                }
                                            },
                                            "required": ["items"]
                                        }
                                    }
                                }
                            },
                            "500": error("Storage unavailable")
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/CreateBook" }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Book created",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": {
                                                "id": { "type": "string" },
                                                "message": { "type": "string" }
                                            },
                                            "required": ["id", "message"]
                                        }
                                    }
                                }
                            },
                            "400": error("Validation error"),
                            "500": error("Storage unavailable")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "parameters": [id_parameter.clone()],
                        "responses": {
                            "200": {
                                "description": "The book",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            },
                            "400": error("Invalid id"),
                            "404": error("Book not found"),
                            "500": error("Storage unavailable")
                        }
                    },
                    "patch": {
                        "summary": "Partially update a book",
                        "tags": ["Books"],
                        "parameters": [id_parameter],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/UpdateBook" }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Book updated, or nothing to update",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": { "message": { "type": "string" } },
                                            "required": ["message"]
                                        }
                                    }
                                }
                            },
                            "400": error("Invalid id or validation error"),
                            "404": error("Book not found"),
                            "500": error("Storage unavailable")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": book_properties,
                        "required": ["id", "title", "author", "genre"]
                    },
                    "CreateBook": {
                        "type": "object",
                        "properties": book_fields.clone(),
                        "required": ["title", "author", "genre"]
                    },
                    "UpdateBook": {
                        "type": "object",
                        "properties": book_fields
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module backed by `store`
pub fn create_module(store: SharedStore) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(store))
}
