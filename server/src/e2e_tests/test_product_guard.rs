//! Products are guarded by `admin` except for `count`.

use axum::http::{Method, StatusCode};
use serde_json::json;

use super::helpers::{TestApp, assert_unauthorized};

#[tokio::test]
async fn test_create_without_token_is_missing_credential() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Method::POST,
            "/products",
            None,
            Some(json!({"name": "Lamp", "price": 20.0, "stock": 3})),
        )
        .await;

    assert_unauthorized(status, &body, "missing_credential");
}

#[tokio::test]
async fn test_create_with_admin_token() {
    let app = TestApp::new();
    let token = app.admin_token();

    let (status, body) = app
        .send(
            Method::POST,
            "/products",
            Some(&token),
            Some(json!({"name": "Lamp", "price": 20.0, "stock": 3})),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["name"], "Lamp");
    assert_eq!(body["id"].as_str().map(str::len), Some(24));
}

#[tokio::test]
async fn test_count_is_exempt() {
    let app = TestApp::new();
    let token = app.admin_token();
    app.send(
        Method::POST,
        "/products",
        Some(&token),
        Some(json!({"name": "Lamp", "price": 20.0, "stock": 3})),
    )
    .await;

    let (status, body) = app.send(Method::GET, "/products/count", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 1}));

    // No strategy runs, so an unusable token does not matter either.
    let (status, body) = app
        .send(Method::GET, "/products/count", Some("garbage"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 1}));
}

#[tokio::test]
async fn test_every_other_operation_requires_credential() {
    let app = TestApp::new();

    for (method, uri) in [
        (Method::GET, "/products"),
        (Method::PATCH, "/products"),
        (Method::GET, "/products/abc"),
        (Method::PATCH, "/products/abc"),
        (Method::PUT, "/products/abc"),
        (Method::DELETE, "/products/abc"),
    ] {
        let (status, body) = app.send(method.clone(), uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body["error"]["code"], "missing_credential", "{method} {uri}");
    }
}

#[tokio::test]
async fn test_garbage_and_tampered_tokens_share_one_answer() {
    let app = TestApp::new();
    let token = app.admin_token();
    let mut segments: Vec<String> = token.split('.').map(str::to_string).collect();
    let first = if segments[2].starts_with('A') { 'B' } else { 'A' };
    segments[2].replace_range(0..1, &first.to_string());
    let tampered = segments.join(".");

    let (status, garbage) = app.send(Method::GET, "/products", Some("garbage"), None).await;
    assert_unauthorized(status, &garbage, "invalid_credential");

    let (status, forged) = app.send(Method::GET, "/products", Some(&tampered), None).await;
    assert_unauthorized(status, &forged, "invalid_credential");

    assert_eq!(garbage, forged);
}
