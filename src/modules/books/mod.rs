pub mod models;
pub mod routes;
pub mod service;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookshop_authz::SharedSecret;
use bookshop_kernel::{settings::Settings, InitCtx, Module};
use serde_json::json;

use service::BookService;
use store::InMemoryBookStore;

/// Books resource: list, get, create, replace, merge and delete
pub struct BooksModule {
    service: BookService,
}

impl BooksModule {
    pub fn new(service: BookService) -> Self {
        Self { service }
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
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
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

/// Create the books module backed by an in-memory store and the configured shared secret
pub fn create_module(settings: &Settings) -> Arc<dyn Module> {
    let service = BookService::new(
        Arc::new(InMemoryBookStore::new()),
        Arc::new(SharedSecret::new(settings.auth.shared_secret.clone())),
    );
    Arc::new(BooksModule::new(service))
}

fn book_content(schema: serde_json::Value) -> serde_json::Value {
    json!({
        "application/json": { "schema": schema.clone() },
        "application/xml": { "schema": schema }
    })
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let book = json!({ "$ref": "#/components/schemas/Book" });
    let book_input = json!({ "$ref": "#/components/schemas/BookInput" });
    let book_patch = json!({ "$ref": "#/components/schemas/BookPatch" });
    let id_param = json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    });
    let auth_param = json!({
        "name": "Authorization",
        "in": "header",
        "required": true,
        "description": "Shared-secret credential",
        "schema": { "type": "string" }
    });
    let text_field = |description: &str| json!({ "type": "string", "description": description });
    let price_field = json!({
        "type": ["number", "null"],
        "format": "double",
        "description": "Price; absent means not specified"
    });

    json!({
        "paths": {
            "": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "parameters": [
                        {
                            "name": "author",
                            "in": "query",
                            "required": false,
                            "description": "Case-insensitive author substring",
                            "schema": { "type": "string" }
                        },
                        {
                            "name": "title",
                            "in": "query",
                            "required": false,
                            "description": "Case-insensitive title substring",
                            "schema": { "type": "string" }
                        }
                    ],
                    "responses": {
                        "200": {
                            "description": "Matching books",
                            "content": book_content(json!({ "type": "array", "items": book.clone() }))
                        }
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "parameters": [auth_param.clone()],
                    "requestBody": { "required": true, "content": book_content(book_input.clone()) },
                    "responses": {
                        "201": { "description": "Created book", "content": book_content(book.clone()) },
                        "401": error_response("Invalid credential")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [id_param.clone()],
                    "responses": {
                        "200": { "description": "The book", "content": book_content(book) },
                        "404": error_response("Unknown id")
                    }
                },
                "put": {
                    "summary": "Replace every field of a book",
                    "tags": ["Books"],
                    "parameters": [id_param.clone(), auth_param.clone()],
                    "requestBody": { "required": true, "content": book_content(book_input) },
                    "responses": {
                        "202": { "description": "Accepted" },
                        "401": error_response("Invalid credential"),
                        "404": error_response("Unknown id")
                    }
                },
                "patch": {
                    "summary": "Update the non-empty fields of a book",
                    "tags": ["Books"],
                    "parameters": [id_param.clone(), auth_param.clone()],
                    "requestBody": { "required": true, "content": book_content(book_patch) },
                    "responses": {
                        "202": { "description": "Accepted" },
                        "401": error_response("Invalid credential"),
                        "404": error_response("Unknown id")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_param, auth_param],
                    "responses": {
                        "204": { "description": "Deleted" },
                        "401": error_response("Invalid credential"),
                        "404": error_response("Unknown id")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64", "description": "Assigned by the store" },
                        "title": text_field("Title of the book"),
                        "author": text_field("Author of the book"),
                        "price": price_field.clone(),
                        "currency": text_field("Currency code")
                    },
                    "required": ["id", "title", "author", "currency"]
                },
                "BookInput": {
                    "type": "object",
                    "properties": {
                        "title": text_field("Title of the book"),
                        "author": text_field("Author of the book"),
                        "price": price_field.clone(),
                        "currency": text_field("Currency code")
                    }
                },
                "BookPatch": {
                    "type": "object",
                    "description": "Empty or missing text fields and a missing price are left unchanged",
                    "properties": {
                        "title": text_field("New title"),
                        "author": text_field("New author"),
                        "price": price_field,
                        "currency": text_field("New currency code")
                    }
                }
            }
        }
    })
}
