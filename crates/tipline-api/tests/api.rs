use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use tipline_api::router;
use tipline_api::state::AppStateInner;
use tipline_crypto::token::DEFAULT_MAX_AGE;
use tipline_crypto::{CodeHasher, SessionTokens};
use tipline_db::Database;

fn app() -> Router {
    app_with_max_age(DEFAULT_MAX_AGE)
}

fn app_with_max_age(token_max_age: Duration) -> Router {
    let state = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        hasher: CodeHasher::with_params(8, 1, 1).unwrap(),
        tokens: SessionTokens::new(b"integration-test-key"),
        token_max_age,
    });
    router(state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let req = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn create_report(app: &Router) -> (String, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/reports",
        Some(json!({
            "title": "Safety violations",
            "category": "safety",
            "body": "Expired certifications at the plant."
        })),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (
        body["ticket"].as_str().unwrap().to_string(),
        body["access_code"].as_str().unwrap().to_string(),
    )
}

async fn register(app: &Router, email: &str) -> (String, i64) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/auth/register",
        Some(json!({ "email": email, "name": "Tester", "password": "hunter22" })),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_i64().unwrap(),
    )
}

// -- Reports --

#[tokio::test]
async fn create_then_fetch_report() {
    let app = app();
    let (ticket, code) = create_report(&app).await;

    assert_eq!(ticket.len(), 12);
    assert!(ticket.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
    assert_eq!(code.len(), 20);
    assert!(code.bytes().all(|b| b.is_ascii_alphanumeric()));

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/reports/{ticket}?code={code}"),
        None,
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticket"], ticket);
    assert_eq!(body["title"], "Safety violations");
    assert_eq!(body["category"], "safety");
    assert_eq!(body["status"], "open");
    assert_eq!(body["messages"], json!([]));
    assert!(body.get("code_hash").is_none());
    assert!(!body.to_string().contains("argon2"));
}

#[tokio::test]
async fn access_code_via_header() {
    let app = app();
    let (ticket, code) = create_report(&app).await;

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/reports/{ticket}"),
        None,
        &[("X-Access-Code", code.as_str())],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn wrong_or_missing_code_is_forbidden() {
    let app = app();
    let (ticket, _code) = create_report(&app).await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/reports/{ticket}?code=AAAAAAAAAAAAAAAAAAAA"),
        None,
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    let (status, _) = send(&app, Method::GET, &format!("/api/v1/reports/{ticket}"), None, &[]).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_ticket_is_not_found() {
    let app = app();
    let (_ticket, code) = create_report(&app).await;

    for uri in [
        format!("/api/v1/reports/ZZZZZZZZZZZZ?code={code}"),
        "/api/v1/reports/ZZZZZZZZZZZZ?code=wrong".to_string(),
        "/api/v1/reports/ZZZZZZZZZZZZ".to_string(),
    ] {
        let (status, body) = send(&app, Method::GET, &uri, None, &[]).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");
    }
}

#[tokio::test]
async fn append_message_grows_thread_by_one() {
    let app = app();
    let (ticket, code) = create_report(&app).await;
    let uri = format!("/api/v1/reports/{ticket}/messages?code={code}");

    let (status, first) = send(&app, Method::POST, &uri, Some(json!({ "body": "first" })), &[]).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["message"], "Message posted");

    let (status, second) =
        send(&app, Method::POST, &uri, Some(json!({ "body": "  second  " })), &[]).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, report) = send(
        &app,
        Method::GET,
        &format!("/api/v1/reports/{ticket}?code={code}"),
        None,
        &[],
    )
    .await;
    let messages = report["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1]["id"], second["id"]);
    assert_eq!(messages[1]["body"], "second");
    assert_eq!(messages[1]["author"], "user");
    assert_eq!(messages[0]["id"], first["id"]);
}

#[tokio::test]
async fn append_checks_access_before_body() {
    let app = app();
    let (ticket, code) = create_report(&app).await;

    // Wrong code with an invalid body: access decides first.
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/reports/{ticket}/messages?code=nope"),
        Some(json!({ "body": "" })),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/reports/ZZZZZZZZZZZZ/messages?code=nope",
        Some(json!({ "body": "hi" })),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Right code, empty body.
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/reports/{ticket}/messages?code={code}"),
        Some(json!({ "body": "   " })),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["body"].is_array());
}

#[tokio::test]
async fn report_validation_errors_are_per_field() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/reports",
        Some(json!({ "title": "x" })),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["title"].is_array());
    assert!(body["errors"]["body"].is_array());
}

async fn send_raw(
    app: &Router,
    uri: &str,
    content_type: Option<&str>,
    raw: &str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(Method::POST).uri(uri);
    if let Some(ct) = content_type {
        builder = builder.header(header::CONTENT_TYPE, ct);
    }
    let req = builder.body(Body::from(raw.to_string())).unwrap();

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn unreadable_report_body_gets_field_errors() {
    let app = app();

    let cases = [
        (None, ""),
        (Some("text/plain"), "title=hello"),
        (Some("application/json"), "not json"),
        (Some("application/json"), "[]"),
    ];
    for (content_type, raw) in cases {
        let (status, body) = send_raw(&app, "/api/v1/reports", content_type, raw).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{raw:?}");
        assert_eq!(body["errors"]["title"], json!(["Missing data for required field."]));
        assert_eq!(body["errors"]["body"], json!(["Missing data for required field."]));
    }
}

#[tokio::test]
async fn mistyped_report_field_gets_field_error() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/reports",
        Some(json!({ "title": 5, "body": "b" })),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["title"], json!(["Not a valid string."]));
    assert!(body["errors"].get("body").is_none());
}

#[tokio::test]
async fn unreadable_auth_and_comment_bodies_get_field_errors() {
    let app = app();

    let (status, body) = send_raw(&app, "/api/v1/auth/register", None, "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["email", "name", "password"] {
        assert!(body["errors"][field].is_array(), "{field}");
    }

    let (status, body) =
        send_raw(&app, "/api/v1/auth/login", Some("application/json"), "{").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["email"].is_array());

    let (token, _) = register(&app, "body@example.com").await;
    let auth = format!("Bearer {token}");
    let (status, post) = send(
        &app,
        Method::POST,
        "/api/v1/posts",
        Some(json!({ "image_url": "https://img.example/1.png" })),
        &[("Authorization", auth.as_str())],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let req = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/v1/posts/{}/comments", post["id"]))
        .header(header::AUTHORIZATION, auth.as_str())
        .body(Body::from("nope"))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["errors"]["body"].is_array());
}

#[tokio::test]
async fn many_reports_get_distinct_tickets() {
    let app = app();
    let mut tickets = std::collections::HashSet::new();
    for _ in 0..25 {
        let (ticket, _) = create_report(&app).await;
        assert!(tickets.insert(ticket));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creation_yields_unique_tickets() {
    let app = app();
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { create_report(&app).await })
        })
        .collect();

    let mut tickets = std::collections::HashSet::new();
    for handle in handles {
        let (ticket, code) = handle.await.unwrap();
        assert!(tickets.insert(ticket.clone()));

        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/api/v1/reports/{ticket}?code={code}"),
            None,
            &[],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn public_reports_hide_secrets() {
    let app = app();
    let (ticket, code) = create_report(&app).await;
    send(
        &app,
        Method::POST,
        &format!("/api/v1/reports/{ticket}/messages?code={code}"),
        Some(json!({ "body": "follow-up" })),
        &[],
    )
    .await;

    let (status, body) = send(&app, Method::GET, "/api/v1/reports/public", None, &[]).await;
    assert_eq!(status, StatusCode::OK);
    let reports = body["reports"].as_array().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["ticket"], ticket);
    assert_eq!(reports[0]["type"], "report");
    assert_eq!(reports[0]["comment_count"], 1);
    assert_eq!(reports[0]["author"]["name"], "Anonymous Whistleblower");
    assert!(!body.to_string().contains(&code));
}

// -- Auth --

#[tokio::test]
async fn register_and_login() {
    let app = app();
    let (_, id) = register(&app, "Alice@Example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        Some(json!({ "email": "alice@example.com", "password": "hunter22" })),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], id);
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["verified"], false);
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["token"].as_str().unwrap().contains('.'));
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = app();
    register(&app, "bob@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        Some(json!({ "email": "BOB@example.com", "name": "Bob", "password": "hunter22" })),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
async fn bad_credentials_unauthorized() {
    let app = app();
    register(&app, "carol@example.com").await;

    for (email, password) in [
        ("carol@example.com", "wrong-password"),
        ("nobody@example.com", "hunter22"),
    ] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": email, "password": password })),
            &[],
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credentials");
    }
}

#[tokio::test]
async fn register_validation() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        Some(json!({ "email": "nope", "name": "D", "password": "123" })),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["email", "name", "password"] {
        assert!(body["errors"][field].is_array(), "missing {field} error");
    }
}

// -- Feed --

#[tokio::test]
async fn protected_routes_need_token() {
    let app = app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/posts",
        Some(json!({ "image_url": "https://img/1.png" })),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/posts",
        Some(json!({ "image_url": "https://img/1.png" })),
        &[("Authorization", "Bearer not-a-token")],
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_session_rejected() {
    let app = app_with_max_age(Duration::ZERO);
    let (token, _) = register(&app, "dave@example.com").await;
    tokio::time::sleep(Duration::from_millis(5)).await;

    let auth = format!("Bearer {token}");
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/posts",
        Some(json!({ "image_url": "https://img/1.png" })),
        &[("Authorization", auth.as_str())],
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn post_like_save_comment_flow() {
    let app = app();
    let (token, user_id) = register(&app, "erin@example.com").await;
    let auth = format!("Bearer {token}");
    let auth_header = [("Authorization", auth.as_str())];

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/v1/posts",
        Some(json!({ "image_url": "https://img/1.png", "caption": "hello" })),
        &auth_header,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let post_id = created["id"].as_i64().unwrap();

    let (_, like) = send(&app, Method::POST, &format!("/api/v1/posts/{post_id}/like"), None, &auth_header).await;
    assert_eq!(like, json!({ "liked": true, "like_count": 1 }));

    let (_, save) = send(&app, Method::POST, &format!("/api/v1/posts/{post_id}/save"), None, &auth_header).await;
    assert_eq!(save, json!({ "saved": true }));

    let (status, comment) = send(
        &app,
        Method::POST,
        &format!("/api/v1/posts/{post_id}/comments"),
        Some(json!({ "body": "first!" })),
        &auth_header,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["comment_count"], 1);
    assert_eq!(comment["comment"]["user"]["id"], user_id);

    let (_, feed) = send(&app, Method::GET, "/api/v1/feed", None, &auth_header).await;
    let post = &feed["posts"][0];
    assert_eq!(post["id"], post_id);
    assert_eq!(post["caption"], "hello");
    assert_eq!(post["like_count"], 1);
    assert_eq!(post["comment_count"], 1);
    assert_eq!(post["liked"], true);
    assert_eq!(post["saved"], true);

    // Anonymous viewers see counts but no personal flags.
    let (status, anon) = send(&app, Method::GET, "/api/v1/feed", None, &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(anon["posts"][0]["like_count"], 1);
    assert_eq!(anon["posts"][0]["liked"], false);

    let (_, unlike) = send(&app, Method::POST, &format!("/api/v1/posts/{post_id}/like"), None, &auth_header).await;
    assert_eq!(unlike, json!({ "liked": false, "like_count": 0 }));
}

#[tokio::test]
async fn missing_post_is_not_found() {
    let app = app();
    let (token, _) = register(&app, "frank@example.com").await;
    let auth = format!("Bearer {token}");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/posts/999/like",
        None,
        &[("Authorization", auth.as_str())],
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health() {
    let app = app();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
