//! End-to-end tests driving the full router against an in-memory database.

use std::str::FromStr;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use bookstore_app::modules::{
    accounts::{models::Account, store as accounts},
    books::{
        models::{Book, NewBook},
        store as books, READ_ALL_BOOKS,
    },
};
use bookstore_app::App;
use bookstore_authz::permission;
use bookstore_kernel::settings::{DatabaseSettings, Settings};
use rust_decimal::Decimal;
use tower::ServiceExt;

const EMAIL: &str = "reviewuser@email.com";
const PASSWORD: &str = "testpass123";

struct Fixture {
    app: App,
    router: Router,
    user: Account,
    book: Book,
}

async fn fixture() -> Fixture {
    let settings = Settings {
        database: DatabaseSettings::in_memory(),
        ..Settings::default()
    };
    let app = App::bootstrap(settings).await.unwrap();
    let db = &app.state.db;

    let user = accounts::create_user(db, "reviewuser", EMAIL, Some(PASSWORD))
        .await
        .unwrap();
    let book = books::create(
        db,
        NewBook {
            title: "Harry Potter".to_string(),
            author: "JK Rowling".to_string(),
            price: Decimal::from_str("25.00").unwrap(),
            cover: None,
        },
    )
    .await
    .unwrap();
    books::add_review(db, book.id, user.id, "An excellent review")
        .await
        .unwrap();

    let router = app.router();
    Fixture {
        app,
        router,
        user,
        book,
    }
}

struct Page {
    status: StatusCode,
    location: Option<String>,
    set_cookie: Option<String>,
    body: String,
}

async fn send(router: &Router, request: Request<Body>) -> Page {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let header_str = |name: header::HeaderName| {
        response
            .headers()
            .get(name)
            .map(|value| value.to_str().unwrap().to_string())
    };
    let location = header_str(header::LOCATION);
    let set_cookie = header_str(header::SET_COOKIE);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    Page {
        status,
        location,
        set_cookie,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    }
}

fn get(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(path: &str, form: &[(&str, &str)], cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(path).header(
        header::CONTENT_TYPE,
        "application/x-www-form-urlencoded",
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(serde_urlencoded::to_string(form).unwrap()))
        .unwrap()
}

/// Log in through the form and return the `name=value` cookie pair.
async fn login(router: &Router, email: &str, password: &str) -> String {
    let page = send(
        router,
        post_form("/accounts/login", &[("login", email), ("password", password)], None),
    )
    .await;
    assert_eq!(page.status, StatusCode::SEE_OTHER, "login failed: {}", page.body);
    let set_cookie = page.set_cookie.expect("session cookie");
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn book_list_for_logged_in_user() {
    let fx = fixture().await;
    let cookie = login(&fx.router, EMAIL, PASSWORD).await;

    let page = send(&fx.router, get("/books", Some(&cookie))).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Harry Potter"));
    assert!(page.body.contains(&fx.book.absolute_url()));
}

#[tokio::test]
async fn book_list_for_logged_out_user_redirects_to_login() {
    let fx = fixture().await;

    let page = send(&fx.router, get("/books", None)).await;
    assert_eq!(page.status, StatusCode::FOUND);
    let location = page.location.unwrap();
    assert_eq!(location, "/accounts/login?next=%2Fbooks");

    let (_, query) = location.split_once('?').unwrap();
    let params: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap();
    assert_eq!(params, vec![("next".to_string(), "/books".to_string())]);

    let login_page = send(&fx.router, get(&location, None)).await;
    assert_eq!(login_page.status, StatusCode::OK);
    assert!(login_page.body.contains("Log In"));
    assert!(login_page.body.contains(r#"name="next" value="/books""#));
}

#[tokio::test]
async fn book_detail_view_with_permissions() {
    let fx = fixture().await;
    permission::grant(&fx.app.state.db, fx.user.id, READ_ALL_BOOKS.codename)
        .await
        .unwrap();
    let cookie = login(&fx.router, EMAIL, PASSWORD).await;

    let page = send(&fx.router, get(&fx.book.absolute_url(), Some(&cookie))).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Harry Potter"));
    assert!(page.body.contains("An excellent review"));
    assert!(page.body.contains("25.00"));

    let missing = send(&fx.router, get("/books/12345", Some(&cookie))).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let unknown = format!("/books/{}", uuid::Uuid::new_v4());
    let missing = send(&fx.router, get(&unknown, Some(&cookie))).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn book_detail_view_without_permission_is_forbidden() {
    let fx = fixture().await;
    let cookie = login(&fx.router, EMAIL, PASSWORD).await;

    let page = send(&fx.router, get(&fx.book.absolute_url(), Some(&cookie))).await;
    assert_eq!(page.status, StatusCode::FORBIDDEN);

    let page = send(&fx.router, get("/books/12345", Some(&cookie))).await;
    assert_eq!(page.status, StatusCode::NOT_FOUND);

    // A well-formed id is gated by the permission whether or not it exists.
    let unknown = format!("/books/{}", uuid::Uuid::new_v4());
    let page = send(&fx.router, get(&unknown, Some(&cookie))).await;
    assert_eq!(page.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_book_id_is_not_found_even_when_logged_out() {
    let fx = fixture().await;

    let page = send(&fx.router, get("/books/12345", None)).await;
    assert_eq!(page.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn book_detail_view_for_logged_out_user_redirects_back() {
    let fx = fixture().await;
    let path = fx.book.absolute_url();

    let page = send(&fx.router, get(&path, None)).await;
    assert_eq!(page.status, StatusCode::FOUND);
    assert_eq!(
        page.location.unwrap(),
        format!("/accounts/login?next=%2Fbooks%2F{}", fx.book.id)
    );
}

#[tokio::test]
async fn superuser_reads_details_without_grants() {
    let fx = fixture().await;
    accounts::create_superuser(&fx.app.state.db, "superadmin", "superadmin@email.com", PASSWORD)
        .await
        .unwrap();
    let cookie = login(&fx.router, "superadmin@email.com", PASSWORD).await;

    let page = send(&fx.router, get(&fx.book.absolute_url(), Some(&cookie))).await;
    assert_eq!(page.status, StatusCode::OK);
}

#[tokio::test]
async fn review_can_be_added_from_detail_page() {
    let fx = fixture().await;
    permission::grant(&fx.app.state.db, fx.user.id, READ_ALL_BOOKS.codename)
        .await
        .unwrap();
    let cookie = login(&fx.router, EMAIL, PASSWORD).await;
    let reviews_url = format!("{}/reviews", fx.book.absolute_url());

    let page = send(
        &fx.router,
        post_form(&reviews_url, &[("review", "Read it twice")], Some(&cookie)),
    )
    .await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location.unwrap(), fx.book.absolute_url());

    let detail = send(&fx.router, get(&fx.book.absolute_url(), Some(&cookie))).await;
    assert!(detail.body.contains("Read it twice"));

    let too_long = "x".repeat(256);
    let page = send(
        &fx.router,
        post_form(&reviews_url, &[("review", &too_long)], Some(&cookie)),
    )
    .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("at most 255"));
}

#[tokio::test]
async fn review_without_permission_is_forbidden() {
    let fx = fixture().await;
    let cookie = login(&fx.router, EMAIL, PASSWORD).await;
    let reviews_url = format!("{}/reviews", fx.book.absolute_url());

    let page = send(
        &fx.router,
        post_form(&reviews_url, &[("review", "sneaky")], Some(&cookie)),
    )
    .await;
    assert_eq!(page.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn search_matches_title_or_author_without_login() {
    let fx = fixture().await;

    let by_title = send(&fx.router, get("/books/search?q=Harry", None)).await;
    assert_eq!(by_title.status, StatusCode::OK);
    assert!(by_title.body.contains("Harry Potter"));

    let by_author = send(&fx.router, get("/books/search?q=rowling", None)).await;
    assert!(by_author.body.contains("Harry Potter"));

    let neither = send(&fx.router, get("/books/search?q=Tolkien", None)).await;
    assert_eq!(neither.status, StatusCode::OK);
    assert!(!neither.body.contains("Harry Potter"));

    let blank = send(&fx.router, get("/books/search", None)).await;
    assert_eq!(blank.status, StatusCode::OK);
    assert!(!blank.body.contains("Harry Potter"));
}

#[tokio::test]
async fn static_pages() {
    let fx = fixture().await;

    let home = send(&fx.router, get("/", None)).await;
    assert_eq!(home.status, StatusCode::OK);
    assert!(home.body.contains("Homepage"));
    assert!(!home.body.contains("Hi there! I should not be on the page."));

    let about = send(&fx.router, get("/about", None)).await;
    assert_eq!(about.status, StatusCode::OK);
    assert!(about.body.contains("About Page"));
}

#[tokio::test]
async fn signup_template() {
    let fx = fixture().await;

    let page = send(&fx.router, get("/accounts/signup", None)).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Sign Up"));
    assert!(!page.body.contains("Hi there! I should not be on the page."));
}

#[tokio::test]
async fn signup_creates_account_and_session() {
    let fx = fixture().await;

    let page = send(
        &fx.router,
        post_form(
            "/accounts/signup",
            &[
                ("username", "newuser"),
                ("email", "newuser@email.com"),
                ("password1", PASSWORD),
                ("password2", PASSWORD),
            ],
            None,
        ),
    )
    .await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location.as_deref(), Some("/"));
    let cookie = page.set_cookie.unwrap();
    let cookie = cookie.split(';').next().unwrap();

    let created = accounts::find_by_email(&fx.app.state.db, "newuser@email.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created.username, "newuser");
    assert!(!created.is_staff);

    let list = send(&fx.router, get("/books", Some(cookie))).await;
    assert_eq!(list.status, StatusCode::OK);
}

#[tokio::test]
async fn signup_errors_rerender_the_form() {
    let fx = fixture().await;

    let page = send(
        &fx.router,
        post_form(
            "/accounts/signup",
            &[
                ("username", "another"),
                ("email", EMAIL),
                ("password1", PASSWORD),
                ("password2", PASSWORD),
            ],
            None,
        ),
    )
    .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("already registered"));
    assert!(page.set_cookie.is_none());
}

#[tokio::test]
async fn wrong_password_rerenders_login() {
    let fx = fixture().await;

    let page = send(
        &fx.router,
        post_form(
            "/accounts/login",
            &[("login", EMAIL), ("password", "nope"), ("next", "/books")],
            None,
        ),
    )
    .await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("not correct"));
    assert!(page.set_cookie.is_none());
}

#[tokio::test]
async fn login_email_ignores_letter_case() {
    let fx = fixture().await;
    let cookie = login(&fx.router, "ReviewUser@Email.COM", PASSWORD).await;

    let list = send(&fx.router, get("/books", Some(&cookie))).await;
    assert_eq!(list.status, StatusCode::OK);
}

#[tokio::test]
async fn login_follows_local_next_only() {
    let fx = fixture().await;

    let page = send(
        &fx.router,
        post_form(
            "/accounts/login",
            &[("login", EMAIL), ("password", PASSWORD), ("next", "/books")],
            None,
        ),
    )
    .await;
    assert_eq!(page.location.as_deref(), Some("/books"));

    let page = send(
        &fx.router,
        post_form(
            "/accounts/login",
            &[
                ("login", EMAIL),
                ("password", PASSWORD),
                ("next", "https://evil.example/"),
            ],
            None,
        ),
    )
    .await;
    assert_eq!(page.location.as_deref(), Some("/"));
}

#[tokio::test]
async fn logout_ends_the_session() {
    let fx = fixture().await;
    let cookie = login(&fx.router, EMAIL, PASSWORD).await;

    let page = send(&fx.router, post_form("/accounts/logout", &[], Some(&cookie))).await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert!(page.set_cookie.unwrap().contains("Max-Age=0"));

    let list = send(&fx.router, get("/books", Some(&cookie))).await;
    assert_eq!(list.status, StatusCode::FOUND);
}

#[tokio::test]
async fn deactivated_account_loses_its_session() {
    let fx = fixture().await;
    let cookie = login(&fx.router, EMAIL, PASSWORD).await;

    accounts::set_active(&fx.app.state.db, fx.user.id, false)
        .await
        .unwrap();

    let list = send(&fx.router, get("/books", Some(&cookie))).await;
    assert_eq!(list.status, StatusCode::FOUND);
}

#[tokio::test]
async fn health_and_openapi() {
    let fx = fixture().await;

    let health = send(&fx.router, get("/healthz", None)).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body, "ok");

    let docs = send(&fx.router, get("/docs/openapi.json", None)).await;
    assert_eq!(docs.status, StatusCode::OK);
    let spec: serde_json::Value = serde_json::from_str(&docs.body).unwrap();
    for path in ["/", "/about", "/books", "/books/{id}", "/books/search", "/accounts/login"] {
        assert!(spec["paths"][path].is_object(), "{path} missing from OpenAPI");
    }
}
