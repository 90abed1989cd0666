use axum::response::Html;

use super::models::{Book, Review, MAX_REVIEW_CHARS};
use crate::utils::html::{errors, escape, page};

fn book_items(books: &[Book]) -> String {
    books
        .iter()
        .map(|book| {
            format!(
                r#"<li><a href="{url}">{title}</a> by {author}</li>"#,
                url = book.absolute_url(),
                title = escape(&book.title),
                author = escape(&book.author),
            )
        })
        .collect()
}

pub fn list_page(books: &[Book]) -> Html<String> {
    let body = if books.is_empty() {
        "<h1>Books</h1>\n<p>No books yet.</p>".to_string()
    } else {
        format!("<h1>Books</h1>\n<ul>{}</ul>", book_items(books))
    };
    page("Books", &body)
}

pub fn search_page(query: &str, books: &[Book]) -> Html<String> {
    let heading = if query.is_empty() {
        "<h1>Search</h1>".to_string()
    } else {
        format!("<h1>Search results for &quot;{}&quot;</h1>", escape(query))
    };
    let results = if books.is_empty() {
        "<p>No books matched.</p>".to_string()
    } else {
        format!("<ul>{}</ul>", book_items(books))
    };
    page("Search Results", &format!("{heading}\n{results}"))
}

pub fn detail_page(book: &Book, reviews: &[Review], draft: &str, review_errors: &[String]) -> Html<String> {
    let cover = book
        .cover
        .as_deref()
        .map(|cover| format!(r#"<img class="cover" src="/media/{}" alt="cover">"#, escape(cover)))
        .unwrap_or_default();
    let reviews_html: String = reviews
        .iter()
        .map(|review| {
            format!(
                "<li>{} ({})</li>",
                escape(&review.review),
                escape(&review.author_username)
            )
        })
        .collect();

    let body = format!(
        r#"<div class="book-detail">
{cover}
<h2><a href="{url}">{title}</a></h2>
<p>Author: {author}</p>
<p>Price: {price}</p>
<div>
<h3>Reviews</h3>
<ul>{reviews_html}</ul>
</div>
<form method="post" action="{url}/reviews">
<p><label for="id_review">Add a review</label>
<textarea name="review" id="id_review" maxlength="{MAX_REVIEW_CHARS}">{draft}</textarea>
{review_errors}</p>
<button type="submit">Submit</button>
</form>
</div>"#,
        url = book.absolute_url(),
        title = escape(&book.title),
        author = escape(&book.author),
        price = book.price,
        draft = escape(draft),
        review_errors = errors(review_errors),
    );
    page(&book.title, &body)
}
