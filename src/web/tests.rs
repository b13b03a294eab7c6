//! HTTP-level tests for the web layer

use super::*;
use crate::config::Config;
use crate::db::{create_test_pool, migrations, DynDatabasePool};
use crate::models::{Blogger, UpdatePostInput, DUPLICATE_TITLE_MESSAGE, REQUIRED_MESSAGE};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

const PASSWORD: &str = "correct horse battery staple";

struct TestApp {
    app: Router,
    state: AppState,
    pool: DynDatabasePool,
}

async fn setup() -> TestApp {
    setup_with(Config::default()).await
}

async fn setup_with(config: Config) -> TestApp {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let state = AppState::new(pool.clone(), &config).expect("Failed to build state");
    TestApp {
        app: build_router(state.clone()),
        state,
        pool,
    }
}

impl TestApp {
    /// Create a blogger and log them in, returning the session token
    async fn blogger(&self, email: &str) -> (Blogger, String) {
        let blogger = self
            .state
            .blogger_service
            .create_user(email, PASSWORD)
            .await
            .expect("Failed to create blogger");
        let session = self
            .state
            .blogger_service
            .login(email, PASSWORD)
            .await
            .expect("Failed to log in");
        (blogger, session.id)
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("session={}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, form: &str, token: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("session={}", token));
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    async fn post_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(self.pool.sqlite().unwrap())
            .await
            .unwrap()
    }

    /// Create a post through the service, optionally publishing it
    async fn post(&self, author: &Blogger, title: &str, published: bool) -> crate::models::Post {
        let post = self
            .state
            .post_service
            .create(author, title, "Body")
            .await
            .expect("Failed to create post");
        if !published {
            return post;
        }
        self.state
            .post_service
            .update(post.id, author, UpdatePostInput::new(title, "Body", true))
            .await
            .expect("Failed to publish post")
    }
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

// ============================================================================
// List
// ============================================================================

#[tokio::test]
async fn test_list_shows_only_published_posts() {
    let t = setup().await;
    let (alice, _) = t.blogger("alice@example.com").await;
    t.post(&alice, "Visible", true).await;
    t.post(&alice, "Hidden draft", false).await;

    let response = t.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Visible"));
    assert!(!html.contains("Hidden draft"));
}

#[tokio::test]
async fn test_list_empty_first_page() {
    let t = setup().await;
    let response = t.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("No posts yet."));
}

#[tokio::test]
async fn test_list_pagination() {
    let t = setup().await;
    let (alice, _) = t.blogger("alice@example.com").await;
    for i in 1..=12 {
        t.post(&alice, &format!("Post number {:02}", i), true).await;
    }

    let first = body_text(t.get("/", None).await).await;
    assert!(first.contains("Post number 01"));
    assert!(first.contains("Post number 10"));
    assert!(!first.contains("Post number 11"));
    assert!(first.contains("Page 1 of 2"));

    let last = body_text(t.get("/?page=last", None).await).await;
    assert!(last.contains("Post number 11"));
    assert!(last.contains("Post number 12"));
    assert!(!last.contains("Post number 01"));

    assert_eq!(t.get("/?page=2", None).await.status(), StatusCode::OK);
    assert_eq!(t.get("/?page=3", None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(t.get("/?page=0", None).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(t.get("/?page=abc", None).await.status(), StatusCode::NOT_FOUND);

    let empty = t.get("/?page=", None).await;
    assert_eq!(empty.status(), StatusCode::OK);
    assert!(body_text(empty).await.contains("Page 1 of 2"));
}

#[tokio::test]
async fn test_list_respects_configured_page_size() {
    let mut config = Config::default();
    config.blog.page_size = 2;
    let t = setup_with(config).await;
    let (alice, _) = t.blogger("alice@example.com").await;
    for title in ["One", "Two", "Three"] {
        t.post(&alice, title, true).await;
    }

    let html = body_text(t.get("/", None).await).await;
    assert!(html.contains("Page 1 of 2"));
    assert!(!html.contains("Three"));
}

// ============================================================================
// Detail
// ============================================================================

#[tokio::test]
async fn test_detail_shows_unpublished_post_and_comments() {
    let t = setup().await;
    let (alice, _) = t.blogger("alice@example.com").await;
    let (bob, _) = t.blogger("bob@example.com").await;
    let post = t.post(&alice, "Draft post", false).await;
    t.state
        .comment_service
        .create(post.id, bob.id, "Nice <b>draft</b>")
        .await
        .unwrap();

    let response = t.get(&format!("/posts/{}/", post.id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Draft post"));
    assert!(html.contains("alice@example.com"));
    assert!(html.contains("bob@example.com"));
    assert!(html.contains("Nice &lt;b&gt;draft&lt;&#x2F;b&gt;"));
    assert!(!html.contains("/edit/"));
}

#[tokio::test]
async fn test_detail_edit_link_for_author() {
    let t = setup().await;
    let (alice, token) = t.blogger("alice@example.com").await;
    let post = t.post(&alice, "Mine", true).await;

    let html = body_text(t.get(&format!("/posts/{}/", post.id), Some(&token)).await).await;
    assert!(html.contains(&format!("/posts/{}/edit/", post.id)));
}

#[tokio::test]
async fn test_detail_unknown_post() {
    let t = setup().await;

    let response = t.get("/posts/999/", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("404"));

    assert_eq!(t.get("/posts/abc/", None).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_detail_signed_id_not_found() {
    let t = setup().await;
    let (alice, _) = t.blogger("alice@example.com").await;
    let post = t.post(&alice, "Signed", true).await;

    assert_eq!(t.get(&format!("/posts/{}/", post.id), None).await.status(), StatusCode::OK);
    assert_eq!(
        t.get(&format!("/posts/+{}/", post.id), None).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_unknown_route_renders_error_page() {
    let t = setup().await;
    let response = t.get("/nowhere", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let html = body_text(response).await;
    assert!(html.contains("Page not found"));
    assert!(html.contains("<html"));
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_requires_login() {
    let t = setup().await;

    let response = t.get("/posts/", None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/accounts/login/?next=%2Fposts%2F");

    let response = t.post_form("/posts/", "title=Sneaky&body=Body", None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(location(&response).starts_with(LOGIN_URL));
    assert_eq!(t.post_count().await, 0);
}

#[tokio::test]
async fn test_create_form_renders() {
    let t = setup().await;
    let (_, token) = t.blogger("alice@example.com").await;

    let response = t.get("/posts/", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("name=\"title\""));
    assert!(html.contains("name=\"body\""));
}

#[tokio::test]
async fn test_create_binds_current_user() {
    let t = setup().await;
    let (alice, token) = t.blogger("alice@example.com").await;
    let (bob, _) = t.blogger("bob@example.com").await;

    // A forged author and published flag are ignored
    let form = format!("title=Hello&body=World&author={}&published=on", bob.id);
    let response = t.post_form("/posts/", &form, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");

    let (author_id, published): (i64, bool) =
        sqlx::query_as("SELECT author_id, published FROM posts WHERE title = 'Hello'")
            .fetch_one(t.pool.sqlite().unwrap())
            .await
            .unwrap();
    assert_eq!(author_id, alice.id);
    assert!(!published);
}

#[tokio::test]
async fn test_create_missing_fields() {
    let t = setup().await;
    let (_, token) = t.blogger("alice@example.com").await;

    let response = t.post_form("/posts/", "title=&body=+", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert_eq!(html.matches(REQUIRED_MESSAGE).count(), 2);
    assert_eq!(t.post_count().await, 0);
}

#[tokio::test]
async fn test_create_duplicate_title() {
    let t = setup().await;
    let (alice, token) = t.blogger("alice@example.com").await;
    t.post(&alice, "Taken", false).await;

    let response = t
        .post_form("/posts/", "title=Taken&body=Another+body", Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(DUPLICATE_TITLE_MESSAGE));
    assert!(html.contains("Another body"));
    assert_eq!(t.post_count().await, 1);
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_update_requires_login() {
    let t = setup().await;
    let (alice, _) = t.blogger("alice@example.com").await;
    let post = t.post(&alice, "Hello", false).await;
    let path = format!("/posts/{}/edit/", post.id);

    let response = t.get(&path, None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        location(&response),
        format!("/accounts/login/?next=%2Fposts%2F{}%2Fedit%2F", post.id)
    );

    // Anonymous callers are redirected before the post is looked up
    let response = t.get("/posts/999/edit/", None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_update_form_prefilled_for_author() {
    let t = setup().await;
    let (alice, token) = t.blogger("alice@example.com").await;
    let post = t.post(&alice, "Prefilled title", false).await;

    let response = t.get(&format!("/posts/{}/edit/", post.id), Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("value=\"Prefilled title\""));
    assert!(html.contains("name=\"published\""));
}

#[tokio::test]
async fn test_update_unknown_post() {
    let t = setup().await;
    let (_, token) = t.blogger("alice@example.com").await;

    let response = t.get("/posts/999/edit/", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = t
        .post_form("/posts/999/edit/", "title=A&body=B", Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_validation_and_duplicate_title() {
    let t = setup().await;
    let (alice, token) = t.blogger("alice@example.com").await;
    t.post(&alice, "First", false).await;
    let second = t.post(&alice, "Second", false).await;
    let path = format!("/posts/{}/edit/", second.id);

    let response = t.post_form(&path, "title=&body=Body", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(REQUIRED_MESSAGE));

    let response = t
        .post_form(&path, "title=First&body=Body&published=on", Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(DUPLICATE_TITLE_MESSAGE));

    let stored = t.state.post_service.get_by_id(second.id).await.unwrap();
    assert_eq!(stored.title, "Second");
    assert!(!stored.published);
}

#[tokio::test]
async fn test_update_unchecked_box_unpublishes() {
    let t = setup().await;
    let (alice, token) = t.blogger("alice@example.com").await;
    let post = t.post(&alice, "Hello", true).await;

    let response = t
        .post_form(&format!("/posts/{}/edit/", post.id), "title=Hello&body=Body", Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let stored = t.state.post_service.get_by_id(post.id).await.unwrap();
    assert!(!stored.published);
}

/// A creates "Hello"/"World", publishes it, and B's identical update is
/// bounced to the login page without touching the post.
#[tokio::test]
async fn test_author_and_stranger_scenario() {
    let t = setup().await;
    let (alice, alice_token) = t.blogger("a@example.com").await;
    let (_, bob_token) = t.blogger("b@example.com").await;

    let response = t
        .post_form("/posts/", "title=Hello&body=World", Some(&alice_token))
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let id: i64 = sqlx::query_scalar("SELECT id FROM posts WHERE title = 'Hello'")
        .fetch_one(t.pool.sqlite().unwrap())
        .await
        .unwrap();
    let post = t.state.post_service.get_by_id(id).await.unwrap();
    assert_eq!(post.author_id, alice.id);
    assert!(!post.published);

    let path = format!("/posts/{}/edit/", id);
    let form = "title=Hello&body=World&published=on";

    let response = t.post_form(&path, form, Some(&alice_token)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");
    assert!(t.state.post_service.get_by_id(id).await.unwrap().published);

    let response = t
        .post_form(&path, "title=Hijacked&body=World&published=", Some(&bob_token))
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), LOGIN_URL);

    let response = t.get(&path, Some(&bob_token)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), LOGIN_URL);

    let stored = t.state.post_service.get_by_id(id).await.unwrap();
    assert_eq!(stored.title, "Hello");
    assert!(stored.published);
}

#[tokio::test]
async fn test_stranger_with_malformed_body_is_redirected() {
    let t = setup().await;
    let (alice, alice_token) = t.blogger("a@example.com").await;
    let (_, bob_token) = t.blogger("b@example.com").await;
    let post = t.post(&alice, "Hello", true).await;
    let path = format!("/posts/{}/edit/", post.id);

    let response = t
        .post_form(&path, "title=a&title=b&body=x", Some(&bob_token))
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), LOGIN_URL);

    let request = Request::builder()
        .method(Method::POST)
        .uri(&path)
        .header(header::CONTENT_TYPE, "text/plain")
        .header(header::COOKIE, format!("session={}", bob_token))
        .body(Body::from("title=Hijacked&body=x"))
        .unwrap();
    let response = t.send(request).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), LOGIN_URL);

    // The author still sees the form rejection
    let response = t
        .post_form(&path, "title=a&title=b&body=x", Some(&alice_token))
        .await;
    assert!(response.status().is_client_error());

    assert_eq!(t.state.post_service.get_by_id(post.id).await.unwrap().title, "Hello");
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
async fn test_login_page_carries_next() {
    let t = setup().await;
    let response = t.get("/accounts/login/?next=%2Fposts%2F", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("value=\"&#x2F;posts&#x2F;\""));
}

#[tokio::test]
async fn test_login_success_sets_cookie_and_redirects() {
    let t = setup().await;
    t.state
        .blogger_service
        .create_user("alice@example.com", PASSWORD)
        .await
        .unwrap();

    let form = format!(
        "email=alice%40example.com&password={}&next=%2Fposts%2F",
        urlencoding::encode(PASSWORD)
    );
    let response = t.post_form("/accounts/login/", &form, None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/posts/");

    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));

    let token = cookie
        .split(';')
        .next()
        .and_then(|c| c.strip_prefix("session="))
        .unwrap()
        .to_string();
    assert_eq!(t.get("/posts/", Some(&token)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_rejects_external_next() {
    let t = setup().await;
    t.state
        .blogger_service
        .create_user("alice@example.com", PASSWORD)
        .await
        .unwrap();

    let form = format!(
        "email=alice%40example.com&password={}&next=https%3A%2F%2Fevil.example%2F",
        urlencoding::encode(PASSWORD)
    );
    let response = t.post_form("/accounts/login/", &form, None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_login_failure_rerenders_form() {
    let t = setup().await;
    t.state
        .blogger_service
        .create_user("alice@example.com", PASSWORD)
        .await
        .unwrap();

    let response = t
        .post_form(
            "/accounts/login/",
            "email=alice%40example.com&password=wrong",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let html = body_text(response).await;
    assert!(html.contains("Please enter a correct email and password"));
    assert!(html.contains("value=\"alice@example.com\""));
}

#[tokio::test]
async fn test_logout_ends_session() {
    let t = setup().await;
    let (_, token) = t.blogger("alice@example.com").await;

    let response = t.post_form("/accounts/logout/", "", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");
    assert!(response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .contains("Max-Age=0"));

    let response = t.get("/posts/", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_unknown_session_is_anonymous() {
    let t = setup().await;
    let response = t.get("/posts/", Some("not-a-real-token")).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let html = body_text(t.get("/", Some("not-a-real-token")).await).await;
    assert!(html.contains("Log in"));
}
