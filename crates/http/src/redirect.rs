//! Redirect responses and `next` parameter handling.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    redirect(StatusCode::FOUND, location)
}

/// `303 See Other` to `location`, used after successful form posts.
pub fn see_other(location: &str) -> Response {
    redirect(StatusCode::SEE_OTHER, location)
}

fn redirect(status: StatusCode, location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (status, [(header::LOCATION, value)]).into_response(),
        Err(_) => {
            tracing::warn!(%location, "refusing to redirect to a non-header-safe location");
            (status, [(header::LOCATION, HeaderValue::from_static("/"))]).into_response()
        }
    }
}

/// `url` with a `next` query parameter appended.
pub fn with_next(url: &str, next: &str) -> String {
    let query = serde_urlencoded::to_string(&[("next", next)]).unwrap_or_default();
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

/// Accept `next` only when it points back into this site.
///
/// Absolute URLs and scheme-relative paths (`//host`) are rejected so the
/// login form cannot be used as an open redirect.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    let next = next?.trim();
    let local = next.starts_with('/') && !next.starts_with("//") && !next.starts_with("/\\");
    local.then_some(next)
}
