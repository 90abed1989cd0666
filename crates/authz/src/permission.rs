//! Named capabilities attachable to accounts.

use sqlx::SqlitePool;

use crate::{AuthzError, Principal};

/// A named capability, e.g. `special_status` / "Can read all books".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permission {
    pub codename: &'static str,
    pub name: &'static str,
}

impl Permission {
    pub const fn new(codename: &'static str, name: &'static str) -> Self {
        Self { codename, name }
    }
}

/// Make a permission known so it can be granted. Idempotent.
pub async fn register(pool: &SqlitePool, permission: &Permission) -> Result<(), AuthzError> {
    sqlx::query(
        "INSERT INTO permissions (codename, name) VALUES (?, ?)
         ON CONFLICT (codename) DO UPDATE SET name = excluded.name",
    )
    .bind(permission.codename)
    .bind(permission.name)
    .execute(pool)
    .await?;
    Ok(())
}

/// Whether `principal` holds `codename`.
///
/// Inactive principals hold nothing; active superusers hold everything.
pub async fn has_permission<P: Principal>(
    pool: &SqlitePool,
    principal: &P,
    codename: &str,
) -> Result<bool, AuthzError> {
    if !principal.is_active() {
        return Ok(false);
    }
    if principal.is_superuser() {
        return Ok(true);
    }

    let found: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM account_permissions WHERE account_id = ? AND codename = ?",
    )
    .bind(principal.principal_id())
    .bind(codename)
    .fetch_optional(pool)
    .await?;

    Ok(found.is_some())
}

/// Attach `codename` to an account. Granting twice is a no-op.
pub async fn grant(pool: &SqlitePool, account_id: i64, codename: &str) -> Result<(), AuthzError> {
    let known: Option<i64> = sqlx::query_scalar("SELECT 1 FROM permissions WHERE codename = ?")
        .bind(codename)
        .fetch_optional(pool)
        .await?;
    if known.is_none() {
        return Err(AuthzError::UnknownPermission(codename.to_string()));
    }

    sqlx::query("INSERT OR IGNORE INTO account_permissions (account_id, codename) VALUES (?, ?)")
        .bind(account_id)
        .bind(codename)
        .execute(pool)
        .await?;

    tracing::info!(account_id, codename, "permission granted");
    Ok(())
}

/// Detach `codename` from an account. Returns whether a grant existed.
pub async fn revoke(pool: &SqlitePool, account_id: i64, codename: &str) -> Result<bool, AuthzError> {
    let result = sqlx::query("DELETE FROM account_permissions WHERE account_id = ? AND codename = ?")
        .bind(account_id)
        .bind(codename)
        .execute(pool)
        .await?;

    let revoked = result.rows_affected() > 0;
    if revoked {
        tracing::info!(account_id, codename, "permission revoked");
    }
    Ok(revoked)
}

/// Codenames granted directly to an account, sorted.
pub async fn granted(pool: &SqlitePool, account_id: i64) -> Result<Vec<String>, AuthzError> {
    let codenames = sqlx::query_scalar(
        "SELECT codename FROM account_permissions WHERE account_id = ? ORDER BY codename",
    )
    .bind(account_id)
    .fetch_all(pool)
    .await?;
    Ok(codenames)
}
