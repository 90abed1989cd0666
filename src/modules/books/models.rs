use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_AUTHOR_CHARS: usize = 200;
pub const MAX_REVIEW_CHARS: usize = 255;
/// Digits kept after the decimal point.
const PRICE_SCALE: u32 = 2;
/// Exclusive upper bound: at most six digits, two of them after the point.
const PRICE_LIMIT: i64 = 10_000;

/// A catalog entry.
#[derive(Debug, Clone)]
pub struct Book {
    /// Random identifier assigned at creation
    pub id: Uuid,
    pub title: String,
    pub author: String,
    /// Always carries two decimal places, e.g. `25.00`
    pub price: Decimal,
    /// Opaque reference to a cover image
    pub cover: Option<String>,
}

impl Book {
    /// Canonical URL of the detail page.
    pub fn absolute_url(&self) -> String {
        format!("/books/{}", self.id)
    }
}

impl std::fmt::Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

/// Row shape of the `books` table; ids and prices are stored as text.
#[derive(Debug, FromRow)]
pub(crate) struct BookRow {
    pub id: String,
    pub title: String,
    pub author: String,
    pub price: String,
    pub cover: Option<String>,
}

impl TryFrom<BookRow> for Book {
    type Error = CatalogError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| CatalogError::Corrupt(format!("book id '{}': {e}", row.id)))?;
        let price = Decimal::from_str(&row.price)
            .map_err(|e| CatalogError::Corrupt(format!("price of book {id}: {e}")))?;
        Ok(Book {
            id,
            title: row.title,
            author: row.author,
            price,
            cover: row.cover,
        })
    }
}

/// Fields for a new book.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub price: Decimal,
    pub cover: Option<String>,
}

impl NewBook {
    /// Check field bounds and return the price normalized to two places.
    pub fn validate(&self) -> Result<Decimal, CatalogError> {
        check_text(&self.title, MAX_TITLE_CHARS).map_err(CatalogError::InvalidTitle)?;
        check_text(&self.author, MAX_AUTHOR_CHARS).map_err(CatalogError::InvalidAuthor)?;
        normalize_price(self.price)
    }
}

fn check_text(value: &str, max: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("must not be blank".to_string());
    }
    if value.chars().count() > max {
        return Err(format!("must be at most {max} characters"));
    }
    Ok(())
}

pub fn normalize_price(price: Decimal) -> Result<Decimal, CatalogError> {
    if price.is_sign_negative() {
        return Err(CatalogError::InvalidPrice(format!("{price} is negative")));
    }
    if price.normalize().scale() > PRICE_SCALE {
        return Err(CatalogError::InvalidPrice(format!(
            "{price} has more than {PRICE_SCALE} decimal places"
        )));
    }
    if price >= Decimal::from(PRICE_LIMIT) {
        return Err(CatalogError::InvalidPrice(format!(
            "{price} must be below {PRICE_LIMIT}"
        )));
    }
    let mut price = price;
    price.rescale(PRICE_SCALE);
    Ok(price)
}

/// A review of a book, with its author's username for display.
#[derive(Debug, Clone, FromRow)]
pub struct Review {
    pub id: i64,
    pub book_id: String,
    pub author_id: i64,
    pub author_username: String,
    pub review: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Display for Review {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.review)
    }
}

/// Case folding shared by stored search keys and search queries.
///
/// SQLite's `lower()` only folds ASCII, so keys are folded here and stored.
pub fn search_key(text: &str) -> String {
    text.to_lowercase()
}

/// Check a review body; returns the trimmed text.
pub fn validate_review(body: &str) -> Result<&str, CatalogError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(CatalogError::EmptyReview);
    }
    let length = body.chars().count();
    if length > MAX_REVIEW_CHARS {
        return Err(CatalogError::ReviewTooLong { length });
    }
    Ok(body)
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid title: {0}")]
    InvalidTitle(String),

    #[error("invalid author: {0}")]
    InvalidAuthor(String),

    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("review must not be blank")]
    EmptyReview,

    #[error("review is {length} characters long; at most 255 are allowed")]
    ReviewTooLong { length: usize },

    #[error("corrupt catalog row: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_book_listing() {
        let book = Book {
            id: Uuid::new_v4(),
            title: "Harry Potter".to_string(),
            author: "JK Rowling".to_string(),
            price: normalize_price(price("25")).unwrap(),
            cover: None,
        };

        assert_eq!(book.to_string(), "Harry Potter");
        assert_eq!(book.author, "JK Rowling");
        assert_eq!(book.price.to_string(), "25.00");
        assert_eq!(book.absolute_url(), format!("/books/{}", book.id));
    }

    #[test]
    fn price_bounds() {
        assert_eq!(normalize_price(price("9999.99")).unwrap().to_string(), "9999.99");
        assert_eq!(normalize_price(price("0.5")).unwrap().to_string(), "0.50");
        assert_eq!(normalize_price(price("3.100")).unwrap().to_string(), "3.10");
        assert!(normalize_price(price("10000")).is_err());
        assert!(normalize_price(price("1.005")).is_err());
        assert!(normalize_price(price("-1")).is_err());
    }

    #[test]
    fn new_book_requires_title_and_author() {
        let mut book = NewBook {
            title: " ".to_string(),
            author: "JK Rowling".to_string(),
            price: price("25.00"),
            cover: None,
        };
        assert!(matches!(book.validate(), Err(CatalogError::InvalidTitle(_))));

        book.title = "t".repeat(201);
        assert!(matches!(book.validate(), Err(CatalogError::InvalidTitle(_))));

        book.title = "Harry Potter".to_string();
        book.author = String::new();
        assert!(matches!(book.validate(), Err(CatalogError::InvalidAuthor(_))));
    }

    #[test]
    fn search_keys_fold_beyond_ascii() {
        assert_eq!(search_key("Émile Zola"), "émile zola");
        assert_eq!(search_key("ÉLAN"), search_key("élan"));
    }

    #[test]
    fn review_bounds() {
        assert_eq!(validate_review("  An excellent review ").unwrap(), "An excellent review");
        assert!(matches!(validate_review("   "), Err(CatalogError::EmptyReview)));
        assert!(validate_review(&"é".repeat(255)).is_ok());
        assert!(matches!(
            validate_review(&"a".repeat(256)),
            Err(CatalogError::ReviewTooLong { length: 256 })
        ));
    }
}
