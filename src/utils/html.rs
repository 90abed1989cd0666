//! Minimal HTML page assembly shared by the modules' views.

use axum::response::Html;

/// Escape text for safe inclusion in HTML element content and attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap `body` (already escaped) in the site layout.
pub fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} | Bookstore</title>
</head>
<body>
<nav>
<a href="/">Home</a>
<a href="/about">About</a>
<a href="/books">Books</a>
<form action="/books/search" method="get"><input type="search" name="q" placeholder="Search books"></form>
</nav>
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    ))
}

/// Render a list of field errors, or nothing.
pub fn errors(messages: &[String]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let items: String = messages
        .iter()
        .map(|m| format!("<li>{}</li>", escape(m)))
        .collect();
    format!(r#"<ul class="errorlist">{items}</ul>"#)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape(r#"<script>alert("x & y")</script>"#),
            "&lt;script&gt;alert(&quot;x &amp; y&quot;)&lt;/script&gt;"
        );
    }

    #[test]
    fn page_wraps_body_and_escapes_title() {
        let Html(html) = page("<Books>", "<p>ok</p>");
        assert!(html.contains("<title>&lt;Books&gt; | Bookstore</title>"));
        assert!(html.contains("<p>ok</p>"));
    }

    #[test]
    fn errors_render_as_list() {
        assert_eq!(errors(&[]), "");
        assert_eq!(
            errors(&["Too <long>".to_string()]),
            r#"<ul class="errorlist"><li>Too &lt;long&gt;</li></ul>"#
        );
    }
}
