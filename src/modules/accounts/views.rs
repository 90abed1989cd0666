use axum::response::Html;

use crate::utils::html::{errors, escape, page};

/// Per-field validation messages for the signup form.
#[derive(Debug, Default)]
pub struct SignupErrors {
    pub username: Vec<String>,
    pub email: Vec<String>,
    pub password1: Vec<String>,
    pub password2: Vec<String>,
}

impl SignupErrors {
    pub fn is_empty(&self) -> bool {
        self.username.is_empty()
            && self.email.is_empty()
            && self.password1.is_empty()
            && self.password2.is_empty()
    }
}

pub fn signup_page(username: &str, email: &str, field_errors: &SignupErrors) -> Html<String> {
    let body = format!(
        r#"<h2>Sign Up</h2>
<form method="post" action="/accounts/signup">
<p><label for="id_username">Username</label>
<input type="text" name="username" id="id_username" value="{username}" maxlength="150" required>
{username_errors}</p>
<p><label for="id_email">Email</label>
<input type="email" name="email" id="id_email" value="{email}" required>
{email_errors}</p>
<p><label for="id_password1">Password</label>
<input type="password" name="password1" id="id_password1" required>
{password1_errors}</p>
<p><label for="id_password2">Password (again)</label>
<input type="password" name="password2" id="id_password2" required>
{password2_errors}</p>
<button type="submit">Sign Up</button>
</form>
<p>Already have an account? <a href="/accounts/login">Log In</a></p>"#,
        username = escape(username),
        email = escape(email),
        username_errors = errors(&field_errors.username),
        email_errors = errors(&field_errors.email),
        password1_errors = errors(&field_errors.password1),
        password2_errors = errors(&field_errors.password2),
    );
    page("Sign Up", &body)
}

pub fn login_page(login: &str, next: Option<&str>, error: Option<&str>) -> Html<String> {
    let next_field = next
        .map(|next| format!(r#"<input type="hidden" name="next" value="{}">"#, escape(next)))
        .unwrap_or_default();
    let error = error
        .map(|message| errors(&[message.to_string()]))
        .unwrap_or_default();

    let body = format!(
        r#"<h2>Log In</h2>
{error}
<form method="post" action="/accounts/login">
<p><label for="id_login">Email</label>
<input type="email" name="login" id="id_login" value="{login}" required></p>
<p><label for="id_password">Password</label>
<input type="password" name="password" id="id_password" required></p>
{next_field}
<button type="submit">Log In</button>
</form>
<p>No account yet? <a href="/accounts/signup">Sign Up</a></p>"#,
        login = escape(login),
    );
    page("Log In", &body)
}
