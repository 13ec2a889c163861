pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use biblio_kernel::{InitCtx, Migration, Module};
use once_cell::sync::OnceCell;

use repository::SqliteBookRepository;
use service::BookCatalogService;

/// Catalog module: owns the `books` table and the `/books` routes.
pub struct BooksModule {
    service: OnceCell<BookCatalogService>,
}

impl BooksModule {
    /// Module whose store is wired from the database during `init`.
    pub const fn new() -> Self {
        Self {
            service: OnceCell::new(),
        }
    }

    /// Module bound to an already-built service.
    pub fn with_service(service: BookCatalogService) -> Self {
        Self {
            service: OnceCell::with_value(service),
        }
    }

    pub fn service(&self) -> Option<&BookCatalogService> {
        self.service.get()
    }
}

impl Default for BooksModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.service.get_or_init(|| {
            let repository = SqliteBookRepository::new(ctx.db.pool().clone());
            BookCatalogService::new(Arc::new(repository))
        });

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        match self.service.get() {
            Some(service) => routes::router(service.clone()),
            None => {
                tracing::warn!(module = self.name(), "routes requested before init, mounting none");
                Router::new()
            }
        }
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_create_books",
            up: r#"
                CREATE TABLE books (
                    seq              INTEGER PRIMARY KEY AUTOINCREMENT,
                    id               TEXT    NOT NULL UNIQUE,
                    title            TEXT    NOT NULL CHECK (title <> ''),
                    author           TEXT    NOT NULL CHECK (author <> ''),
                    category         TEXT    NOT NULL CHECK (category <> ''),
                    published_year   INTEGER NOT NULL,
                    available_copies INTEGER NOT NULL CHECK (available_copies >= 0)
                );
                CREATE INDEX books_category_idx ON books (category);
                CREATE INDEX books_published_year_idx ON books (published_year);
                "#,
        }]
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

fn error_responses() -> serde_json::Value {
    serde_json::json!({
        "description": "Error",
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_response(description: &str, many: bool) -> serde_json::Value {
    let schema = if many {
        serde_json::json!({ "type": "array", "items": { "$ref": "#/components/schemas/Book" } })
    } else {
        serde_json::json!({ "$ref": "#/components/schemas/Book" })
    };
    serde_json::json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn id_param() -> serde_json::Value {
    serde_json::json!({
        "name": "id", "in": "path", "required": true,
        "schema": { "type": "string", "format": "uuid" }
    })
}

fn json_body(schema: &str) -> serde_json::Value {
    serde_json::json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{schema}") }
            }
        }
    })
}

/// OpenAPI fragment; paths are relative to the module mount point.
fn openapi_fragment() -> serde_json::Value {
    serde_json::json!({
        "paths": openapi_paths(),
        "components": { "schemas": openapi_schemas() }
    })
}

fn openapi_paths() -> serde_json::Value {
    serde_json::json!({
        "/": {
            "get": {
                "summary": "List books",
                "tags": ["Books"],
                "responses": { "200": book_response("All books", true) }
            },
            "post": {
                "summary": "Create a book",
                "tags": ["Books"],
                "requestBody": json_body("BookCandidate"),
                "responses": {
                    "201": book_response("Stored book", false),
                    "400": error_responses()
                }
            }
        },
        "/category/{category}": {
            "get": {
                "summary": "List books in a category",
                "tags": ["Books"],
                "parameters": [{
                    "name": "category", "in": "path", "required": true,
                    "schema": { "type": "string" }
                }],
                "responses": { "200": book_response("Books with exactly this category", true) }
            }
        },
        "/after/{year}": {
            "get": {
                "summary": "List books published after a year",
                "tags": ["Books"],
                "parameters": [{
                    "name": "year", "in": "path", "required": true,
                    "schema": { "type": "integer", "format": "int32" }
                }],
                "responses": {
                    "200": book_response("Books published strictly after the year", true),
                    "400": error_responses()
                }
            }
        },
        "/{id}": {
            "delete": {
                "summary": "Delete an out-of-stock book",
                "tags": ["Books"],
                "parameters": [id_param()],
                "responses": {
                    "200": {
                        "description": "Deleted",
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "properties": { "message": { "type": "string" } }
                                }
                            }
                        }
                    },
                    "400": error_responses(),
                    "404": error_responses()
                }
            }
        },
        "/{id}/copies": {
            "put": {
                "summary": "Adjust available copies",
                "tags": ["Books"],
                "parameters": [id_param()],
                "requestBody": json_body("CopiesChange"),
                "responses": {
                    "200": book_response("Updated book", false),
                    "400": error_responses(),
                    "404": error_responses()
                }
            }
        },
        "/{id}/category": {
            "put": {
                "summary": "Change the category",
                "tags": ["Books"],
                "parameters": [id_param()],
                "requestBody": json_body("CategoryChange"),
                "responses": {
                    "200": book_response("Updated book", false),
                    "400": error_responses(),
                    "404": error_responses()
                }
            }
        },
        "/health": {
            "get": {
                "summary": "Books health check",
                "tags": ["Books"],
                "responses": {
                    "200": {
                        "description": "OK",
                        "content": { "text/plain": { "schema": { "type": "string" } } }
                    }
                }
            }
        }
    })
}

fn openapi_schemas() -> serde_json::Value {
    serde_json::json!({
        "Book": {
            "type": "object",
            "properties": {
                "id": { "type": "string", "format": "uuid" },
                "title": { "type": "string" },
                "author": { "type": "string" },
                "category": { "type": "string" },
                "publishedYear": { "type": "integer", "format": "int32" },
                "availableCopies": { "type": "integer", "minimum": 0 }
            },
            "required": ["id", "title", "author", "category", "publishedYear", "availableCopies"]
        },
        "BookCandidate": {
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "author": { "type": "string" },
                "category": { "type": "string" },
                "publishedYear": { "type": "integer" },
                "availableCopies": { "type": "integer", "minimum": 0 }
            },
            "required": ["title", "author", "category", "publishedYear", "availableCopies"]
        },
        "CopiesChange": {
            "type": "object",
            "properties": { "change": { "type": "integer" } },
            "required": ["change"]
        },
        "CategoryChange": {
            "type": "object",
            "properties": { "category": { "type": "string" } },
            "required": ["category"]
        }
    })
}

/// Create a new instance of the books module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(BooksModule::new())
}
