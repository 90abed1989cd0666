//! HTTP handlers of the Books module.

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
    Form,
};
use bookstore_http::{redirect, AppError};
use serde::Deserialize;
use uuid::Uuid;

use super::models::{Book, CatalogError};
use super::{store, views, READ_ALL_BOOKS};
use crate::modules::accounts::viewer::Viewer;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct ReviewForm {
    review: String,
}

/// List every book; login required
pub(super) async fn list_books(
    State(state): State<AppState>,
    viewer: Viewer,
) -> Result<Html<String>, AppError> {
    viewer.require_login(&state.settings.auth)?;

    let books = store::list(&state.db).await.map_err(AppError::internal)?;
    Ok(views::list_page(&books))
}

/// Book detail with its reviews; login and permission required
pub(super) async fn book_detail(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_book_id(&id)?;
    viewer
        .require_permission(&state, READ_ALL_BOOKS.codename)
        .await?;

    let book = load_book(&state, id).await?;
    let reviews = store::reviews(&state.db, book.id)
        .await
        .map_err(AppError::internal)?;
    Ok(views::detail_page(&book, &reviews, "", &[]))
}

/// Add a review from the detail page
pub(super) async fn add_review(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Response, AppError> {
    let id = parse_book_id(&id)?;
    let account = viewer
        .require_permission(&state, READ_ALL_BOOKS.codename)
        .await?;

    let book = load_book(&state, id).await?;
    match store::add_review(&state.db, book.id, account.id, &form.review).await {
        Ok(_) => Ok(redirect::see_other(&book.absolute_url())),
        Err(err @ (CatalogError::EmptyReview | CatalogError::ReviewTooLong { .. })) => {
            let reviews = store::reviews(&state.db, book.id)
                .await
                .map_err(AppError::internal)?;
            Ok(views::detail_page(&book, &reviews, &form.review, &[err.to_string()]).into_response())
        }
        Err(err) => Err(AppError::internal(err)),
    }
}

/// Case-insensitive search on title or author; open to everyone
pub(super) async fn search_books(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Html<String>, AppError> {
    let query = query.q.unwrap_or_default();
    let books = store::search(&state.db, &query)
        .await
        .map_err(AppError::internal)?;
    Ok(views::search_page(query.trim(), &books))
}

/// Only well-formed ids name a detail page; anything else is not found
/// before any login or permission check.
fn parse_book_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::not_found(format!("no book with id '{id}'")))
}

async fn load_book(state: &AppState, id: Uuid) -> Result<Book, AppError> {
    store::find(&state.db, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("no book with id '{id}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_ids_are_not_found() {
        assert!(matches!(parse_book_id("12345"), Err(AppError::NotFound(_))));
        assert!(parse_book_id("6f1d2c3e-9a47-4b8e-8f3a-2d5c7e9b1a04").is_ok());
    }
}
