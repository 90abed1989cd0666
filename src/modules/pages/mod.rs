use async_trait::async_trait;
use axum::{response::Html, routing::get, Router};
use bookstore_kernel::Module;
use serde_json::json;

use crate::utils::html::page;

/// Static informational pages
pub struct PagesModule;

impl PagesModule {
    pub const fn new() -> Self {
        Self
    }
}

impl Default for PagesModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for PagesModule {
    fn name(&self) -> &'static str {
        "pages"
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(home))
            .route("/about", get(about))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let static_page = |summary: &str| {
            json!({
                "get": {
                    "summary": summary,
                    "tags": ["Pages"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": { "text/html": { "schema": { "type": "string" } } }
                        }
                    }
                }
            })
        };

        Some(json!({
            "paths": {
                "/": static_page("Home page"),
                "/about": static_page("About page")
            }
        }))
    }
}

async fn home() -> Html<String> {
    page(
        "Home",
        "<h1>Homepage</h1>\n<p>Welcome to the bookstore. Browse the <a href=\"/books\">catalog</a> or search it above.</p>",
    )
}

async fn about() -> Html<String> {
    page(
        "About",
        "<h1>About Page</h1>\n<p>A small bookstore: accounts, a catalog with reviews and search.</p>",
    )
}

/// Create a new instance of the pages module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(PagesModule::new())
}
