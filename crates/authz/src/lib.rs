//! Authentication and authorization primitives shared by the bookstore modules.
//!
//! The crate owns three concerns: password credentials, server-side sessions
//! and named permission grants. It works against the `accounts`,
//! `sessions`, `permissions` and `account_permissions` tables created by the
//! accounts module.

pub mod password;
pub mod permission;
mod schema;
pub mod session;

use thiserror::Error;

pub use password::{PasswordError, PasswordHasherService};
pub use permission::Permission;
pub use schema::SCHEMA;
pub use session::{Session, SessionStore};

/// An identity whose permissions can be checked.
pub trait Principal {
    fn principal_id(&self) -> i64;
    fn is_active(&self) -> bool;
    fn is_superuser(&self) -> bool;
}

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("unknown permission '{0}'")]
    UnknownPermission(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
