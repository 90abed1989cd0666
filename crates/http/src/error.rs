//! Request failures and their HTTP rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::redirect;

/// Body of every non-redirect error response, wrapped as `{"error": ...}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub details: Vec<serde_json::Value>,
    pub trace_id: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
struct Envelope {
    error: ErrorBody,
}

/// Why a request could not be served.
#[derive(Error, Debug)]
pub enum AppError {
    /// No session; the client is sent to the login page and back to `next`.
    #[error("login required for {next}")]
    LoginRequired { login_url: String, next: String },

    /// Authenticated, but lacking a required permission.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn login_required(login_url: impl Into<String>, next: impl Into<String>) -> Self {
        Self::LoginRequired {
            login_url: login_url.into(),
            next: next.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Wrap a store or plumbing failure.
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();

        let (status, code, message) = match self {
            AppError::LoginRequired { login_url, next } => {
                tracing::debug!(%next, "anonymous request redirected to login");
                return redirect::found(&redirect::with_next(&login_url, &next));
            }
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, "forbidden", message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            AppError::Internal(err) => {
                let cause = format!("{err:#}");
                tracing::error!(%error_id, error = %cause, "request failed");
                // The cause stays in the logs for release builds.
                let message = if cfg!(debug_assertions) {
                    cause
                } else {
                    "An internal server error occurred".to_string()
                };
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };

        if status.is_client_error() {
            tracing::warn!(%error_id, code, status = status.as_u16(), %message, "request rejected");
        }

        let envelope = Envelope {
            error: ErrorBody {
                code,
                message,
                details: Vec::new(),
                trace_id: error_id.to_string(),
                timestamp: OffsetDateTime::now_utc().to_string(),
            },
        };

        (status, Json(envelope)).into_response()
    }
}
