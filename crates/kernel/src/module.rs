use async_trait::async_trait;
use axum::Router;
use sqlx::SqlitePool;

use crate::settings::Settings;

/// What a module sees while starting up.
pub struct InitCtx<'a> {
    pub settings: &'a Settings,
    pub db: &'a SqlitePool,
}

/// One schema step owned by a module. `id` is unique within the module and
/// orders the module's steps; `up` is a SQL script run in one transaction.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// A feature area of the bookstore (pages, accounts, books).
#[async_trait]
pub trait Module: Sync + Send {
    /// Stable name; keys the module's rows in the migration ledger.
    fn name(&self) -> &'static str;

    /// Runs after every migration has been applied, in registration order.
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Routes with their full paths, already bound to any state they need.
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI `paths` and `components` this module adds to `/docs/openapi.json`.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    /// Runs at shutdown, in reverse registration order.
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
