pub mod models;
pub mod store;
pub mod viewer;
mod views;

use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use bookstore_http::{redirect, AppError};
use bookstore_kernel::{InitCtx, Migration, Module};
use serde::Deserialize;
use serde_json::json;

use crate::state::AppState;
use models::AccountError;
use viewer::Viewer;
use views::SignupErrors;

const MIN_PASSWORD_CHARS: usize = 8;
const LOGIN_REDIRECT: &str = "/";

/// Accounts module: registration, login and logout
pub struct AccountsModule {
    state: AppState,
}

impl AccountsModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for AccountsModule {
    fn name(&self) -> &'static str {
        "accounts"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let accounts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(ctx.db)
            .await?;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            accounts,
            "accounts module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/accounts/signup", get(signup_form).post(signup))
            .route("/accounts/login", get(login_form).post(login))
            .route("/accounts/logout", get(logout).post(logout))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let html_page = |description: &str| {
            json!({
                "description": description,
                "content": { "text/html": { "schema": { "type": "string" } } }
            })
        };
        let see_other = |description: &str| json!({ "description": description });

        Some(json!({
            "paths": {
                "/accounts/signup": {
                    "get": {
                        "summary": "Signup form",
                        "tags": ["Accounts"],
                        "responses": { "200": html_page("Signup form") }
                    },
                    "post": {
                        "summary": "Create an account and log in",
                        "tags": ["Accounts"],
                        "requestBody": {
                            "content": {
                                "application/x-www-form-urlencoded": {
                                    "schema": { "$ref": "#/components/schemas/SignupForm" }
                                }
                            }
                        },
                        "responses": {
                            "200": html_page("Form re-rendered with field errors"),
                            "303": see_other("Account created; redirect to the home page")
                        }
                    }
                },
                "/accounts/login": {
                    "get": {
                        "summary": "Login form",
                        "tags": ["Accounts"],
                        "parameters": [{
                            "name": "next", "in": "query", "required": false,
                            "schema": { "type": "string" }
                        }],
                        "responses": { "200": html_page("Login form") }
                    },
                    "post": {
                        "summary": "Log in with email and password",
                        "tags": ["Accounts"],
                        "requestBody": {
                            "content": {
                                "application/x-www-form-urlencoded": {
                                    "schema": { "$ref": "#/components/schemas/LoginForm" }
                                }
                            }
                        },
                        "responses": {
                            "200": html_page("Form re-rendered with an error"),
                            "303": see_other("Session issued; redirect to `next`")
                        }
                    }
                },
                "/accounts/logout": {
                    "post": {
                        "summary": "End the current session",
                        "tags": ["Accounts"],
                        "responses": { "303": see_other("Redirect to the home page") }
                    }
                }
            },
            "components": {
                "schemas": {
                    "SignupForm": {
                        "type": "object",
                        "properties": {
                            "username": { "type": "string", "maxLength": 150 },
                            "email": { "type": "string", "format": "email" },
                            "password1": { "type": "string", "minLength": MIN_PASSWORD_CHARS },
                            "password2": { "type": "string" }
                        },
                        "required": ["username", "email", "password1", "password2"]
                    },
                    "LoginForm": {
                        "type": "object",
                        "properties": {
                            "login": { "type": "string", "format": "email" },
                            "password": { "type": "string" },
                            "next": { "type": "string" }
                        },
                        "required": ["login", "password"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![
            Migration {
                id: "001_init",
                up: r#"
                    CREATE TABLE accounts (
                        id            INTEGER PRIMARY KEY AUTOINCREMENT,
                        username      TEXT NOT NULL UNIQUE CHECK (length(username) BETWEEN 1 AND 150),
                        email         TEXT NOT NULL CHECK (email <> ''),
                        email_key     TEXT NOT NULL UNIQUE,
                        password_hash TEXT NOT NULL,
                        is_active     INTEGER NOT NULL DEFAULT 1,
                        is_staff      INTEGER NOT NULL DEFAULT 0,
                        is_superuser  INTEGER NOT NULL DEFAULT 0,
                        date_joined   TEXT NOT NULL
                    );
                    "#,
            },
            Migration {
                id: "002_sessions_permissions",
                up: bookstore_authz::SCHEMA,
            },
        ]
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "accounts module stopped");
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SignupForm {
    username: String,
    email: String,
    password1: String,
    password2: String,
}

impl SignupForm {
    fn validate(&self) -> SignupErrors {
        let mut errors = SignupErrors::default();
        let required = || "This field is required.".to_string();

        if self.username.trim().is_empty() {
            errors.username.push(required());
        } else if models::validate_username(self.username.trim()).is_err() {
            errors.username.push(
                "Enter a valid username of at most 150 letters, digits and @/./+/-/_ characters."
                    .to_string(),
            );
        }

        if self.email.trim().is_empty() {
            errors.email.push(required());
        } else if models::normalize_email(&self.email).is_err() {
            errors.email.push("Enter a valid email address.".to_string());
        }

        if self.password1.is_empty() {
            errors.password1.push(required());
        } else if self.password1.chars().count() < MIN_PASSWORD_CHARS {
            errors.password1.push(format!(
                "This password is too short. It must contain at least {MIN_PASSWORD_CHARS} characters."
            ));
        }

        if self.password2.is_empty() {
            errors.password2.push(required());
        } else if self.password1 != self.password2 {
            errors
                .password2
                .push("You must type the same password each time.".to_string());
        }

        errors
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginForm {
    login: String,
    password: String,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NextQuery {
    next: Option<String>,
}

/// Signup form endpoint
async fn signup_form() -> impl IntoResponse {
    views::signup_page("", "", &SignupErrors::default())
}

/// Create an account, then log it in
async fn signup(State(state): State<AppState>, Form(form): Form<SignupForm>) -> Result<Response, AppError> {
    let mut field_errors = form.validate();
    if !field_errors.is_empty() {
        return Ok(views::signup_page(&form.username, &form.email, &field_errors).into_response());
    }

    let created = store::create_user(
        &state.db,
        &form.username,
        &form.email,
        Some(&form.password1),
    )
    .await;

    let account = match created {
        Ok(account) => account,
        Err(AccountError::DuplicateUsername(_)) => {
            field_errors
                .username
                .push("A user with that username already exists.".to_string());
            return Ok(views::signup_page(&form.username, &form.email, &field_errors).into_response());
        }
        Err(AccountError::DuplicateEmail(_)) => {
            field_errors
                .email
                .push("A user is already registered with this email address.".to_string());
            return Ok(views::signup_page(&form.username, &form.email, &field_errors).into_response());
        }
        Err(err) => return Err(AppError::internal(err)),
    };

    start_session(&state, account.id, LOGIN_REDIRECT).await
}

/// Login form endpoint
async fn login_form(Query(query): Query<NextQuery>) -> impl IntoResponse {
    views::login_page("", redirect::safe_next(query.next.as_deref()), None)
}

/// Exchange credentials for a session
async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Result<Response, AppError> {
    let next = redirect::safe_next(form.next.as_deref());

    let account = store::authenticate(&state.db, &form.login, &form.password)
        .await
        .map_err(AppError::internal)?;

    let Some(account) = account else {
        let message = "The email address and/or password you specified are not correct.";
        return Ok(views::login_page(&form.login, next, Some(message)).into_response());
    };

    tracing::info!(account_id = account.id, "account logged in");
    start_session(&state, account.id, next.unwrap_or(LOGIN_REDIRECT)).await
}

/// End the session, if any, and clear the cookie
async fn logout(State(state): State<AppState>, viewer: Viewer) -> Result<Response, AppError> {
    if let Some(token) = &viewer.token {
        state
            .sessions
            .revoke(token)
            .await
            .map_err(AppError::internal)?;
    }
    if let Some(account) = &viewer.account {
        tracing::info!(account_id = account.id, "account logged out");
    }

    let mut response = redirect::see_other(LOGIN_REDIRECT);
    response.headers_mut().append(
        header::SET_COOKIE,
        viewer::clear_session_cookie(&state.settings.auth),
    );
    Ok(response)
}

async fn start_session(state: &AppState, account_id: i64, target: &str) -> Result<Response, AppError> {
    let session = state
        .sessions
        .create(account_id)
        .await
        .map_err(AppError::internal)?;

    let mut response = redirect::see_other(target);
    response.headers_mut().append(
        header::SET_COOKIE,
        viewer::session_cookie(&state.settings.auth, &session.token),
    );
    Ok(response)
}

/// Create a new instance of the accounts module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(AccountsModule::new(state))
}
