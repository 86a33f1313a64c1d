//! Person registration generates, stores and delivers a credential.

use axum::http::{Method, StatusCode};
use serde_json::json;

use super::helpers::TestApp;
use crate::accounts::REGISTRATION_SUBJECT;
use crate::auth::{Credential, verify_credential};
use crate::notify::recording::Notification;
use crate::repository::Repository;

#[tokio::test]
async fn test_signup_returns_person_without_credential() {
    let app = TestApp::new();

    let body = app.sign_up("Ana", "ana@example.com").await;

    assert_eq!(body["first_names"], "Ana");
    assert_eq!(body["email"], "ana@example.com");
    assert!(body.get("password_hash").is_none());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_signup_stores_encrypted_credential_and_notifies() {
    let app = TestApp::new();

    let body = app.sign_up("Ana", "ana@example.com").await;
    let id = body["id"].as_str().expect("id");

    let plaintext = app.delivered_credential("ana@example.com");
    let stored = app.persons.find_by_id(id).expect("stored");
    let hash = stored.password_hash.expect("hash");
    assert_ne!(hash.as_str(), plaintext);
    assert!(verify_credential(&Credential::new(plaintext.clone()), &hash));

    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 2);
    assert!(matches!(
        &sent[0],
        Notification::Email { destination, subject, body }
            if destination == "ana@example.com"
                && subject == REGISTRATION_SUBJECT
                && body.ends_with(&plaintext)
    ));
    assert!(matches!(
        &sent[1],
        Notification::Sms { phone, body } if phone == "3001234567" && body.ends_with(&plaintext)
    ));
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let app = TestApp::new();
    app.sign_up("Ana", "ana@example.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/persons",
            None,
            Some(json!({
                "first_names": "Other",
                "last_names": "Person",
                "email": "ana@example.com",
                "phone": "3009999999",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "conflict");
}

#[tokio::test]
async fn test_person_reads_are_open() {
    let app = TestApp::new();
    let created = app.sign_up("Ana", "ana@example.com").await;
    let id = created["id"].as_str().expect("id");

    let (status, body) = app.send(Method::GET, &format!("/persons/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);

    let (status, body) = app.send(Method::GET, "/persons/count", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 1}));
}

#[tokio::test]
async fn test_password_hash_cannot_be_patched() {
    let app = TestApp::new();
    let created = app.sign_up("Ana", "ana@example.com").await;
    let id = created["id"].as_str().expect("id");

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/persons/{id}"),
            None,
            Some(json!({"password_hash": "chosen"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
