//! Tokens stop admitting requests once the clock passes their expiry.

use axum::http::{Method, StatusCode};

use super::helpers::{HOUR_MS, TestApp, assert_unauthorized};

#[tokio::test]
async fn test_token_valid_until_expiry_then_refused() {
    let app = TestApp::new();
    let token = app.admin_token();

    let (status, _) = app.send(Method::GET, "/products", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    app.clock.advance(HOUR_MS);
    let (status, _) = app.send(Method::GET, "/products", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    app.clock.advance(1_000);
    let (status, body) = app.send(Method::GET, "/products", Some(&token), None).await;
    assert_unauthorized(status, &body, "invalid_credential");
}

#[tokio::test]
async fn test_expired_message_matches_garbage_message() {
    let app = TestApp::new();
    let token = app.admin_token();
    app.clock.advance(2 * HOUR_MS);

    let (_, expired) = app.send(Method::GET, "/products", Some(&token), None).await;
    let (_, garbage) = app.send(Method::GET, "/products", Some("garbage"), None).await;

    assert_eq!(expired, garbage);
}
