//! Login exchanges an email and password for a token.

use axum::http::{Method, StatusCode};
use serde_json::json;

use super::helpers::{TestApp, assert_unauthorized};
use crate::auth::{Credential, encrypt_credential};
use crate::models::Person;
use crate::repository::Repository;

#[tokio::test]
async fn test_login_with_delivered_credential_admits_requests() {
    let app = TestApp::new();
    app.sign_up("Ana", "ana@example.com").await;
    let password = app.delivered_credential("ana@example.com");

    let (status, body) = app
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({"email": "ana@example.com", "password": password})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let token = body["token"].as_str().expect("token");

    let (status, _) = app.send(Method::GET, "/products", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_known_credential_and_wrong_password() {
    let app = TestApp::new();
    let hash = encrypt_credential(&Credential::new("Xk9#mQ2z".to_string())).expect("hash");
    app.persons
        .create(Person {
            id: String::new(),
            first_names: "Bea".to_string(),
            last_names: "Ruiz".to_string(),
            email: "bea@example.com".to_string(),
            phone: "3007654321".to_string(),
            password_hash: Some(hash),
        })
        .expect("stored");

    let (status, body) = app
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({"email": "bea@example.com", "password": "Xk9#mQ2z"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let claims = app
        .tokens
        .validate(body["token"].as_str().expect("token"))
        .expect("valid token");
    assert_eq!(claims["email"], "bea@example.com");
    assert_eq!(claims["name"], "Bea Ruiz");

    let (status, wrong) = app
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({"email": "bea@example.com", "password": "wrongpass"})),
        )
        .await;
    assert_unauthorized(status, &wrong, "invalid_credential");

    let (status, unknown) = app
        .send(
            Method::POST,
            "/login",
            None,
            Some(json!({"email": "nobody@example.com", "password": "wrongpass"})),
        )
        .await;
    assert_unauthorized(status, &unknown, "invalid_credential");
    assert_eq!(wrong, unknown);
}
