use std::sync::Arc;

use bookstore_authz::SessionStore;
use bookstore_kernel::settings::Settings;
use sqlx::SqlitePool;

/// Shared handles every request handler can reach.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub settings: Arc<Settings>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(db: SqlitePool, settings: Settings) -> Self {
        let sessions = SessionStore::new(db.clone(), settings.auth.session_ttl_secs);
        Self {
            db,
            settings: Arc::new(settings),
            sessions,
        }
    }
}
