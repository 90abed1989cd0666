//! Server-side sessions keyed by an opaque random token.

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::AuthzError;

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub account_id: i64,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(pool: SqlitePool, ttl_secs: i64) -> Self {
        Self {
            pool,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Issue a new session for `account_id`.
    pub async fn create(&self, account_id: i64) -> Result<Session, AuthzError> {
        let session = Session {
            token: Uuid::new_v4().simple().to_string(),
            account_id,
            expires_at: Utc::now() + self.ttl,
        };

        sqlx::query("INSERT INTO sessions (token, account_id, expires_at) VALUES (?, ?, ?)")
            .bind(&session.token)
            .bind(session.account_id)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!(account_id, "session created");
        Ok(session)
    }

    /// Account behind `token`, if the session exists and has not expired.
    /// Expired sessions are deleted on sight.
    pub async fn resolve(&self, token: &str) -> Result<Option<i64>, AuthzError> {
        let row: Option<(i64, DateTime<Utc>)> =
            sqlx::query_as("SELECT account_id, expires_at FROM sessions WHERE token = ?")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((account_id, expires_at)) if expires_at > Utc::now() => Ok(Some(account_id)),
            Some(_) => {
                self.revoke(token).await?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Remove one session. Unknown tokens are ignored.
    pub async fn revoke(&self, token: &str) -> Result<(), AuthzError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Remove every session belonging to an account. Returns how many.
    pub async fn revoke_all(&self, account_id: i64) -> Result<u64, AuthzError> {
        let result = sqlx::query("DELETE FROM sessions WHERE account_id = ?")
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
