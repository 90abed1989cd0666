//! Account persistence.

use bookstore_authz::{password, PasswordHasherService};
use chrono::Utc;
use sqlx::SqlitePool;

use super::models::{
    email_key, normalize_email, validate_username, Account, AccountError, NewAccount,
};

const ACCOUNT_COLUMNS: &str =
    "id, username, email, password_hash, is_active, is_staff, is_superuser, date_joined";

/// Create a regular account: active, not staff, not superuser.
///
/// Without a password the account gets an unusable credential and cannot log
/// in until one is set.
pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    password: Option<&str>,
) -> Result<Account, AccountError> {
    insert(
        pool,
        NewAccount {
            username,
            email,
            password,
            ..NewAccount::default()
        },
    )
    .await
}

/// Create an account with staff and superuser flags set.
pub async fn create_superuser(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    password: &str,
) -> Result<Account, AccountError> {
    insert(
        pool,
        NewAccount {
            username,
            email,
            password: Some(password),
            is_staff: true,
            is_superuser: true,
        },
    )
    .await
}

pub async fn insert(pool: &SqlitePool, new: NewAccount<'_>) -> Result<Account, AccountError> {
    let username = new.username.trim();
    validate_username(username)?;
    let email = normalize_email(new.email)?;

    if find_by_username(pool, username).await?.is_some() {
        return Err(AccountError::DuplicateUsername(username.to_string()));
    }
    if find_by_email(pool, &email).await?.is_some() {
        return Err(AccountError::DuplicateEmail(email));
    }

    let password_hash = match new.password {
        Some(raw) => PasswordHasherService::new().hash_password(raw)?,
        None => password::unusable_password(),
    };

    let result = sqlx::query_as::<_, Account>(&format!(
        "INSERT INTO accounts (username, email, email_key, password_hash, is_active, is_staff, is_superuser, date_joined)
         VALUES (?, ?, ?, ?, 1, ?, ?, ?)
         RETURNING {ACCOUNT_COLUMNS}"
    ))
    .bind(username)
    .bind(&email)
    .bind(email_key(&email))
    .bind(&password_hash)
    .bind(new.is_staff)
    .bind(new.is_superuser)
    .bind(Utc::now())
    .fetch_one(pool)
    .await;

    // A concurrent insert can still trip the unique indexes.
    let account = match result {
        Ok(account) => account,
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(if db.message().contains("email") {
                AccountError::DuplicateEmail(email)
            } else {
                AccountError::DuplicateUsername(username.to_string())
            });
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!(
        account_id = account.id,
        username = %account.username,
        superuser = account.is_superuser,
        "account created"
    );
    Ok(account)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Account>, AccountError> {
    let account = sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(account)
}

/// Look up by email, ignoring letter case.
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Account>, AccountError> {
    let Ok(email) = normalize_email(email) else {
        return Ok(None);
    };
    let account = sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email_key = ?"
    ))
    .bind(email_key(&email))
    .fetch_optional(pool)
    .await?;
    Ok(account)
}

pub async fn find_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<Account>, AccountError> {
    let account = sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = ?"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(account)
}

/// The account for `email` if `password` matches and the account is active.
pub async fn authenticate(
    pool: &SqlitePool,
    email: &str,
    password: &str,
) -> Result<Option<Account>, AccountError> {
    let Some(account) = find_by_email(pool, email).await? else {
        return Ok(None);
    };

    if !PasswordHasherService::new().verify_password(password, &account.password_hash)? {
        tracing::info!(account_id = account.id, "login rejected: bad credentials");
        return Ok(None);
    }
    if !account.is_active {
        tracing::info!(account_id = account.id, "login rejected: account inactive");
        return Ok(None);
    }

    Ok(Some(account))
}

/// Replace the password of an account.
pub async fn set_password(pool: &SqlitePool, id: i64, password: &str) -> Result<bool, AccountError> {
    let hash = PasswordHasherService::new().hash_password(password)?;
    let result = sqlx::query("UPDATE accounts SET password_hash = ? WHERE id = ?")
        .bind(hash)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Enable or disable an account. Returns whether the account exists.
pub async fn set_active(pool: &SqlitePool, id: i64, active: bool) -> Result<bool, AccountError> {
    let result = sqlx::query("UPDATE accounts SET is_active = ? WHERE id = ?")
        .bind(active)
        .bind(id)
        .execute(pool)
        .await?;
    tracing::info!(account_id = id, active, "account activation changed");
    Ok(result.rows_affected() > 0)
}

/// Remove an account; its reviews, sessions and grants go with it.
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, AccountError> {
    let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    let deleted = result.rows_affected() > 0;
    if deleted {
        tracing::info!(account_id = id, "account deleted");
    }
    Ok(deleted)
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<Account>, AccountError> {
    let accounts = sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(accounts)
}
