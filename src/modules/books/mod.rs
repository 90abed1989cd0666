pub mod models;
mod routes;
pub mod store;
mod views;

use async_trait::async_trait;
use axum::{
    routing::{get, post},
    Router,
};
use bookstore_authz::{permission, Permission};
use bookstore_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use crate::state::AppState;

/// Grants access to every book's detail page.
pub const READ_ALL_BOOKS: Permission = Permission::new("special_status", "Can read all books");

/// Books module: catalog listing, detail pages, reviews and search
pub struct BooksModule {
    state: AppState,
}

impl BooksModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        permission::register(ctx.db, &READ_ALL_BOOKS).await?;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            permission = READ_ALL_BOOKS.codename,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/books", get(routes::list_books))
            .route("/books/search", get(routes::search_books))
            .route("/books/{id}", get(routes::book_detail))
            .route("/books/{id}/reviews", post(routes::add_review))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let html_page = |description: &str| {
            json!({
                "description": description,
                "content": { "text/html": { "schema": { "type": "string" } } }
            })
        };
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
        let login_redirect = json!({ "description": "Not logged in; redirect to the login page with `next`" });
        let book_id = json!({
            "name": "id", "in": "path", "required": true,
            "schema": { "type": "string", "format": "uuid" }
        });

        Some(json!({
            "paths": {
                "/books": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": html_page("Every book in the catalog"),
                            "302": login_redirect
                        }
                    }
                },
                "/books/search": {
                    "get": {
                        "summary": "Search books by title or author",
                        "tags": ["Books"],
                        "parameters": [{
                            "name": "q", "in": "query", "required": false,
                            "schema": { "type": "string" }
                        }],
                        "responses": {
                            "200": html_page("Books whose title or author contains `q`, ignoring case")
                        }
                    }
                },
                "/books/{id}": {
                    "get": {
                        "summary": "Book detail with reviews",
                        "tags": ["Books"],
                        "parameters": [book_id],
                        "responses": {
                            "200": html_page("The book and its reviews"),
                            "302": login_redirect,
                            "403": error("Missing the special_status permission"),
                            "404": error("No such book")
                        }
                    }
                },
                "/books/{id}/reviews": {
                    "post": {
                        "summary": "Add a review",
                        "tags": ["Books"],
                        "parameters": [book_id],
                        "requestBody": {
                            "content": {
                                "application/x-www-form-urlencoded": {
                                    "schema": { "$ref": "#/components/schemas/ReviewForm" }
                                }
                            }
                        },
                        "responses": {
                            "200": html_page("Detail page re-rendered with a review error"),
                            "302": login_redirect,
                            "303": { "description": "Review stored; redirect to the detail page" },
                            "403": error("Missing the special_status permission"),
                            "404": error("No such book")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string", "format": "uuid" },
                            "title": { "type": "string", "maxLength": models::MAX_TITLE_CHARS },
                            "author": { "type": "string", "maxLength": models::MAX_AUTHOR_CHARS },
                            "price": { "type": "string", "example": "25.00" },
                            "cover": { "type": "string", "nullable": true }
                        },
                        "required": ["id", "title", "author", "price"]
                    },
                    "ReviewForm": {
                        "type": "object",
                        "properties": {
                            "review": { "type": "string", "maxLength": models::MAX_REVIEW_CHARS }
                        },
                        "required": ["review"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE books (
                    id     TEXT PRIMARY KEY NOT NULL,
                    title  TEXT NOT NULL CHECK (title <> ''),
                    author TEXT NOT NULL CHECK (author <> ''),
                    price  TEXT NOT NULL,
                    cover  TEXT,
                    -- Unicode-lowercased title and author, matched by search
                    title_key  TEXT NOT NULL,
                    author_key TEXT NOT NULL
                );

                CREATE TABLE reviews (
                    id         INTEGER PRIMARY KEY AUTOINCREMENT,
                    book_id    TEXT NOT NULL REFERENCES books(id) ON DELETE CASCADE,
                    author_id  INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
                    review     TEXT NOT NULL CHECK (length(review) <= 255),
                    created_at TEXT NOT NULL
                );
                CREATE INDEX reviews_book_idx ON reviews (book_id);
                CREATE INDEX reviews_author_idx ON reviews (author_id);
                "#,
        }]
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(state))
}
