use bookstore_authz::{PasswordError, Principal};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use thiserror::Error;

const MAX_USERNAME_CHARS: usize = 150;

/// A registered user.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
}

impl Principal for Account {
    fn principal_id(&self) -> i64 {
        self.id
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn is_superuser(&self) -> bool {
        self.is_superuser
    }
}

/// Fields for a new account; flags default to a regular, active user.
#[derive(Debug, Clone, Default)]
pub struct NewAccount<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: Option<&'a str>,
    pub is_staff: bool,
    pub is_superuser: bool,
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("usernames must be 1-150 letters, digits or @.+-_")]
    InvalidUsername,

    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    #[error("a user with username '{0}' already exists")]
    DuplicateUsername(String),

    #[error("a user with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub fn validate_username(username: &str) -> Result<(), AccountError> {
    let length = username.chars().count();
    let allowed = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if length == 0 || length > MAX_USERNAME_CHARS || !allowed {
        return Err(AccountError::InvalidUsername);
    }
    Ok(())
}

/// Trim the address and lower-case its domain part; the local part is kept
/// as typed.
pub fn normalize_email(email: &str) -> Result<String, AccountError> {
    let email = email.trim();
    let invalid = || AccountError::InvalidEmail(email.to_string());

    let (local, domain) = email.rsplit_once('@').ok_or_else(invalid)?;
    let domain_ok = !domain.is_empty()
        && (domain.contains('.') || domain.eq_ignore_ascii_case("localhost"))
        && !domain.starts_with('.')
        && !domain.ends_with('.');
    if local.is_empty() || local.contains('@') || !domain_ok || email.contains(char::is_whitespace)
    {
        return Err(invalid());
    }

    Ok(format!("{}@{}", local, domain.to_lowercase()))
}

/// Identity of an address: two emails that differ only in letter case belong
/// to the same account.
pub fn email_key(normalized: &str) -> String {
    normalized.to_lowercase()
}
