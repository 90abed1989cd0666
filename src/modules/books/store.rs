//! Catalog persistence: books and their reviews.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::models::{search_key, validate_review, Book, BookRow, CatalogError, NewBook, Review};

const BOOK_COLUMNS: &str = "id, title, author, price, cover";
const REVIEW_SELECT: &str = "SELECT r.id, r.book_id, r.author_id, a.username AS author_username, r.review, r.created_at
     FROM reviews r JOIN accounts a ON a.id = r.author_id";

/// Insert a book under a fresh random id.
pub async fn create(pool: &SqlitePool, new: NewBook) -> Result<Book, CatalogError> {
    let price = new.validate()?;
    let book = Book {
        id: Uuid::new_v4(),
        title: new.title.trim().to_string(),
        author: new.author.trim().to_string(),
        price,
        cover: new.cover.filter(|cover| !cover.trim().is_empty()),
    };

    sqlx::query(
        "INSERT INTO books (id, title, author, price, cover, title_key, author_key)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(book.id.to_string())
    .bind(&book.title)
    .bind(&book.author)
    .bind(book.price.to_string())
    .bind(&book.cover)
    .bind(search_key(&book.title))
    .bind(search_key(&book.author))
    .execute(pool)
    .await?;

    tracing::info!(book_id = %book.id, title = %book.title, "book created");
    Ok(book)
}

/// Every book, in insertion order.
pub async fn list(pool: &SqlitePool) -> Result<Vec<Book>, CatalogError> {
    let rows = sqlx::query_as::<_, BookRow>(&format!(
        "SELECT {BOOK_COLUMNS} FROM books ORDER BY rowid"
    ))
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(Book::try_from).collect()
}

pub async fn find(pool: &SqlitePool, id: Uuid) -> Result<Option<Book>, CatalogError> {
    let row = sqlx::query_as::<_, BookRow>(&format!(
        "SELECT {BOOK_COLUMNS} FROM books WHERE id = ?"
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;
    row.map(Book::try_from).transpose()
}

/// Books whose title or author contains `query`, ignoring case.
///
/// A blank query matches nothing.
pub async fn search(pool: &SqlitePool, query: &str) -> Result<Vec<Book>, CatalogError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let pattern = format!("%{}%", escape_like(&search_key(query)));
    let rows = sqlx::query_as::<_, BookRow>(&format!(
        "SELECT {BOOK_COLUMNS} FROM books
         WHERE title_key LIKE ?1 ESCAPE '\\' OR author_key LIKE ?1 ESCAPE '\\'
         ORDER BY rowid"
    ))
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    tracing::debug!(%query, hits = rows.len(), "catalog search");
    rows.into_iter().map(Book::try_from).collect()
}

/// Treat `%`, `_` and the escape character itself literally in LIKE patterns.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Remove a book and, by cascade, its reviews.
pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<bool, CatalogError> {
    let result = sqlx::query("DELETE FROM books WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    let deleted = result.rows_affected() > 0;
    if deleted {
        tracing::info!(book_id = %id, "book deleted");
    }
    Ok(deleted)
}

pub async fn add_review(
    pool: &SqlitePool,
    book_id: Uuid,
    author_id: i64,
    body: &str,
) -> Result<Review, CatalogError> {
    let body = validate_review(body)?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO reviews (book_id, author_id, review, created_at) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(book_id.to_string())
    .bind(author_id)
    .bind(body)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    let review = sqlx::query_as::<_, Review>(&format!("{REVIEW_SELECT} WHERE r.id = ?"))
        .bind(id)
        .fetch_one(pool)
        .await?;

    tracing::info!(review_id = review.id, book_id = %book_id, author_id, "review added");
    Ok(review)
}

/// Reviews of a book, oldest first.
pub async fn reviews(pool: &SqlitePool, book_id: Uuid) -> Result<Vec<Review>, CatalogError> {
    let reviews = sqlx::query_as::<_, Review>(&format!(
        "{REVIEW_SELECT} WHERE r.book_id = ? ORDER BY r.id"
    ))
    .bind(book_id.to_string())
    .fetch_all(pool)
    .await?;
    Ok(reviews)
}

/// Reviews written by an account, across all books.
pub async fn reviews_by(pool: &SqlitePool, author_id: i64) -> Result<Vec<Review>, CatalogError> {
    let reviews = sqlx::query_as::<_, Review>(&format!(
        "{REVIEW_SELECT} WHERE r.author_id = ? ORDER BY r.id"
    ))
    .bind(author_id)
    .fetch_all(pool)
    .await?;
    Ok(reviews)
}
