//! Resolving the request's session cookie to an account.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
};
use bookstore_authz::permission;
use bookstore_http::AppError;
use bookstore_kernel::settings::AuthSettings;

use super::models::Account;
use super::store;
use crate::state::AppState;

/// Who is making the request, and where they were going.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub account: Option<Account>,
    /// Session token presented by the client, valid or not.
    pub token: Option<String>,
    /// Path and query of the request, used as the login `next` target.
    pub path: String,
}

impl Viewer {
    /// The authenticated account, or a redirect to the login page.
    pub fn require_login(&self, auth: &AuthSettings) -> Result<&Account, AppError> {
        self.account
            .as_ref()
            .ok_or_else(|| AppError::login_required(&auth.login_url, &self.path))
    }

    /// Ordered checks: session first, then the named permission.
    pub async fn require_permission(
        &self,
        state: &AppState,
        codename: &str,
    ) -> Result<&Account, AppError> {
        let account = self.require_login(&state.settings.auth)?;

        let allowed = permission::has_permission(&state.db, account, codename)
            .await
            .map_err(AppError::internal)?;
        if !allowed {
            tracing::warn!(account_id = account.id, codename, path = %self.path, "permission denied");
            return Err(AppError::forbidden(format!(
                "missing permission '{codename}'"
            )));
        }

        Ok(account)
    }
}

impl FromRequestParts<AppState> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let token = session_token(&parts.headers, &state.settings.auth.session_cookie);
        let account = match &token {
            Some(token) => resolve(state, token).await?,
            None => None,
        };

        Ok(Viewer {
            account,
            token,
            path,
        })
    }
}

async fn resolve(state: &AppState, token: &str) -> Result<Option<Account>, AppError> {
    let Some(account_id) = state
        .sessions
        .resolve(token)
        .await
        .map_err(AppError::internal)?
    else {
        return Ok(None);
    };

    let account = store::find_by_id(&state.db, account_id)
        .await
        .map_err(AppError::internal)?;

    // A deactivated account keeps its session row but is treated as anonymous.
    Ok(account.filter(|account| account.is_active))
}

/// Value of the named cookie, if present.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value carrying a freshly issued session token.
pub fn session_cookie(auth: &AuthSettings, token: &str) -> HeaderValue {
    let secure = if auth.secure_cookies { "; Secure" } else { "" };
    let value = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        auth.session_cookie, token, auth.session_ttl_secs, secure
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| clear_session_cookie(auth))
}

/// `Set-Cookie` value that makes the client forget its session.
pub fn clear_session_cookie(auth: &AuthSettings) -> HeaderValue {
    let value = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        auth.session_cookie
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("session=; Max-Age=0"))
}
