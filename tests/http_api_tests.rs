//! End-to-end tests for the REST API using the in-memory repository.
//!
//! Requests are driven through the router with `tower::ServiceExt::oneshot`,
//! so these cover routing, extractors, status codes and response shapes.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use quotesmith::config::AppConfig;
use quotesmith::db::RepositoryFactory;
use quotesmith::http::{create_router, AppState};

fn test_app() -> Router {
    let repo = RepositoryFactory::create_local();
    let config = AppConfig::for_tests("http-test-secret");
    create_router(AppState::new(repo, config))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn register_body(email: &str) -> Value {
    json!({
        "name": "Test Owner",
        "email": email,
        "password": "s3cret-pass",
    })
}

/// Register an account and return its bearer token.
async fn register(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/v1/users/register",
        None,
        Some(register_body(email)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().unwrap().to_string()
}

// =========================================================
// Health and auth plumbing
// =========================================================

#[tokio::test]
async fn health_reports_connected_repository() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn missing_token_yields_no_token_code() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/v1/users/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "NO_TOKEN");
}

#[tokio::test]
async fn garbage_token_yields_invalid_token_code() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/v1/clients", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn expired_token_yields_expired_token_code() {
    let app = test_app();
    // Issued with a negative TTL so it is already past expiry.
    let token = quotesmith::auth::issue_token(
        "http-test-secret",
        quotesmith::models::UserId::generate(),
        -1,
    )
    .unwrap();

    let (status, body) = send(&app, "GET", "/v1/users/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "EXPIRED_TOKEN");
}

// =========================================================
// Accounts
// =========================================================

#[tokio::test]
async fn register_login_and_profile_round_trip() {
    let app = test_app();
    let token = register(&app, "owner@test.dev").await;

    let (status, profile) = send(&app, "GET", "/v1/users/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "owner@test.dev");
    assert!(profile.get("password_hash").is_none());

    let (status, login) = send(
        &app,
        "POST",
        "/v1/users/login",
        None,
        Some(json!({"email": "owner@test.dev", "password": "s3cret-pass"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(login["token"].as_str().is_some());
}

#[tokio::test]
async fn duplicate_registration_is_a_bad_request() {
    let app = test_app();
    register(&app, "owner@test.dev").await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/users/register",
        None,
        Some(register_body("owner@test.dev")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn bad_credentials_are_a_bad_request() {
    let app = test_app();
    register(&app, "owner@test.dev").await;

    let (status, _) = send(
        &app,
        "POST",
        "/v1/users/login",
        None,
        Some(json!({"email": "owner@test.dev", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_update_and_stats() {
    let app = test_app();
    let token = register(&app, "owner@test.dev").await;

    let (status, updated) = send(
        &app,
        "PUT",
        "/v1/users/profile",
        Some(&token),
        Some(json!({"name": "Renamed", "city": "Springfield"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Renamed");
    assert_eq!(updated["city"], "Springfield");

    let (status, stats) = send(&app, "GET", "/v1/users/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_quotes"], 0);
    assert_eq!(stats["approval_rate"], 0.0);
}

// =========================================================
// Clients and quotes
// =========================================================

async fn create_client(app: &Router, token: &str, name: &str, email: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/v1/clients",
        Some(token),
        Some(json!({"name": name, "email": email})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn client_crud_round_trip() {
    let app = test_app();
    let token = register(&app, "owner@test.dev").await;

    let client = create_client(&app, &token, "Jane Roe", "jane@x.dev").await;
    // No tax id in the request, so the email stands in.
    assert_eq!(client["tax_id"], "jane@x.dev");
    assert_eq!(client["status"], "active");
    let id = client["id"].as_str().unwrap().to_string();

    let (status, list) = send(&app, "GET", "/v1/clients", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/v1/clients/{}", id),
        Some(&token),
        Some(json!({"status": "blocked"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "blocked");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/v1/clients/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/v1/clients/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tenants_cannot_see_each_others_records() {
    let app = test_app();
    let first = register(&app, "first@test.dev").await;
    let second = register(&app, "second@test.dev").await;

    let client = create_client(&app, &first, "Jane", "jane@x.dev").await;
    let id = client["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "GET",
        &format!("/v1/clients/{}", id),
        Some(&second),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn quote_lifecycle_over_http() {
    let app = test_app();
    let token = register(&app, "owner@test.dev").await;
    let client = create_client(&app, &token, "Jane Roe", "jane@x.dev").await;
    let client_id = client["id"].as_str().unwrap().to_string();

    let (status, quote) = send(
        &app,
        "POST",
        "/v1/quotes",
        Some(&token),
        Some(json!({
            "client_id": client_id,
            "items": [
                {"quantity": 2, "description": "Consulting", "unit_price": 150.0},
                {"quantity": 1, "description": "Setup", "unit_price": 99.5},
            ],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(quote["number"], 1);
    assert_eq!(quote["status"], "pending");
    assert_eq!(quote["total"], 399.5);
    assert_eq!(quote["items"][0]["subtotal"], 300.0);
    let quote_id = quote["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/v1/quotes/{}/status", quote_id),
        Some(&token),
        Some(json!({"status": "approved"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "approved");

    let (status, list) = send(&app, "GET", "/v1/quotes", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);

    let (status, stats) = send(&app, "GET", "/v1/users/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_quotes"], 1);
    assert_eq!(stats["approved_quotes"], 1);
    assert_eq!(stats["approval_rate"], 100.0);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/v1/quotes/{}", quote_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn invalid_quote_items_are_rejected() {
    let app = test_app();
    let token = register(&app, "owner@test.dev").await;
    let client = create_client(&app, &token, "Jane", "jane@x.dev").await;
    let client_id = client["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/v1/quotes",
        Some(&token),
        Some(json!({"client_id": client_id, "items": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, _) = send(
        &app,
        "POST",
        "/v1/quotes",
        Some(&token),
        Some(json!({
            "client_id": client_id,
            "items": [{"quantity": 0, "description": "x", "unit_price": 1.0}],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn quote_pdf_is_served_inline() {
    let app = test_app();
    let token = register(&app, "owner@test.dev").await;
    let client = create_client(&app, &token, "Jane Roe", "jane@x.dev").await;
    let client_id = client["id"].as_str().unwrap().to_string();

    let (status, quote) = send(
        &app,
        "POST",
        "/v1/quotes",
        Some(&token),
        Some(json!({
            "client_id": client_id,
            "items": [{"quantity": 1, "description": "Work", "unit_price": 10.0}],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let quote_id = quote["id"].as_str().unwrap();

    let request = Request::builder()
        .method("GET")
        .uri(format!("/v1/quotes/{}/pdf", quote_id))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "inline; filename=quote_1.pdf"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.starts_with(b"%PDF"));
}

// =========================================================
// Logo upload
// =========================================================

fn multipart_request(
    uri: &str,
    token: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> Request<Body> {
    let boundary = "logo-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"logo\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn logo_upload_updates_the_profile_and_serves_the_file() {
    let app = test_app();
    let token = register(&app, "owner@test.dev").await;

    let png = [0x89u8, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];
    let request = multipart_request("/v1/users/logo", &token, "logo.png", "image/png", &png);
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let profile: Value = serde_json::from_slice(&bytes).unwrap();
    let logo_path = profile["logo_path"].as_str().unwrap().to_string();
    assert!(logo_path.starts_with("/uploads/"));
    assert!(logo_path.ends_with(".png"));

    // The profile endpoint reflects the stored path.
    let (status, profile) = send(&app, "GET", "/v1/users/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["logo_path"], logo_path);

    // The stored file is served back at its public path.
    let request = Request::builder()
        .method("GET")
        .uri(&logo_path)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let served = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(served.as_ref(), &png);
}

#[tokio::test]
async fn non_image_logo_upload_is_rejected() {
    let app = test_app();
    let token = register(&app, "owner@test.dev").await;

    let request = multipart_request("/v1/users/logo", &token, "notes.txt", "text/plain", b"hi");
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
