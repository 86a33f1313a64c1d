//! Deleting a person is guarded by `admin` on its own.

use axum::http::{Method, StatusCode};

use super::helpers::{TestApp, assert_unauthorized};

#[tokio::test]
async fn test_delete_account_requires_admin() {
    let app = TestApp::new();
    let created = app.sign_up("Ana", "ana@example.com").await;
    let uri = format!("/persons/{}", created["id"].as_str().expect("id"));

    let (status, body) = app.send(Method::DELETE, &uri, None, None).await;
    assert_unauthorized(status, &body, "missing_credential");

    let (status, body) = app.send(Method::DELETE, &uri, Some("garbage"), None).await;
    assert_unauthorized(status, &body, "invalid_credential");

    let token = app.admin_token();
    let (status, _) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}
