//! Bookstore application library
//!
//! Wires the application modules (accounts, books, pages) onto the module
//! registry, the SQLite store and the HTTP server.

pub mod modules;
pub mod state;
pub mod utils;

use anyhow::Context;
use axum::Router;
use bookstore_kernel::{settings::Settings, InitCtx, ModuleRegistry};

pub use state::AppState;

/// A bootstrapped application: migrated store, initialized modules.
pub struct App {
    pub registry: ModuleRegistry,
    pub state: AppState,
}

impl App {
    /// Connect to the database, apply pending migrations and initialize every
    /// module.
    pub async fn bootstrap(settings: Settings) -> anyhow::Result<Self> {
        let db = bookstore_db::connect(&settings.database)
            .await
            .context("failed to open database")?;
        let state = AppState::new(db, settings);

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &state)?;
        tracing::debug!(modules = registry.module_count(), "modules registered");

        let applied = bookstore_db::migrate(&state.db, &registry.collect_migrations())
            .await
            .context("failed to apply migrations")?;
        tracing::info!(applied, "database schema up to date");

        let ctx = InitCtx {
            settings: &state.settings,
            db: &state.db,
        };
        registry.init_modules(&ctx).await?;

        Ok(Self { registry, state })
    }

    /// The full HTTP router with middleware.
    pub fn router(&self) -> Router {
        bookstore_http::build_router(&self.registry, &self.state.settings)
    }

    /// Serve until shutdown, then stop the modules.
    pub async fn serve(&self) -> anyhow::Result<()> {
        bookstore_http::start_server(&self.registry, &self.state.settings).await?;
        self.registry.stop_modules().await
    }
}
