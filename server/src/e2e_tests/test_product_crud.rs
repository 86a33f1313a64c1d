//! The eight CRUD operations on products, as an administrator.

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use super::helpers::{TestApp, query_json};

async fn create(app: &TestApp, token: &str, name: &str, stock: u32) -> String {
    let (status, body) = app
        .send(
            Method::POST,
            "/products",
            Some(token),
            Some(json!({"name": name, "price": 10.0, "stock": stock})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["id"].as_str().expect("id").to_string()
}

fn names(body: &Value) -> Vec<&str> {
    body.as_array()
        .expect("array")
        .iter()
        .filter_map(|product| product["name"].as_str())
        .collect()
}

#[tokio::test]
async fn test_find_with_filter_and_pagination() {
    let app = TestApp::new();
    let token = app.admin_token();
    for (name, stock) in [("a", 0), ("b", 4), ("c", 0), ("d", 0)] {
        create(&app, &token, name, stock).await;
    }

    let (status, body) = app.send(Method::GET, "/products", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), ["a", "b", "c", "d"]);

    let filter = query_json(&json!({"where": {"stock": 0}, "skip": 1, "limit": 1}));
    let (status, body) = app
        .send(Method::GET, &format!("/products?filter={filter}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), ["c"]);

    let conditions = query_json(&json!({"stock": 0}));
    let (_, body) = app
        .send(Method::GET, &format!("/products/count?where={conditions}"), None, None)
        .await;
    assert_eq!(body, json!({"count": 3}));
}

#[tokio::test]
async fn test_update_all_returns_count() {
    let app = TestApp::new();
    let token = app.admin_token();
    create(&app, &token, "a", 0).await;
    create(&app, &token, "b", 4).await;

    let conditions = query_json(&json!({"stock": 0}));
    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/products?where={conditions}"),
            Some(&token),
            Some(json!({"stock": 10})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 1}));
}

#[tokio::test]
async fn test_by_id_operations() {
    let app = TestApp::new();
    let token = app.admin_token();
    let id = create(&app, &token, "Lamp", 3).await;
    let uri = format!("/products/{id}");

    let (status, body) = app
        .send(Method::PATCH, &uri, Some(&token), Some(json!({"price": 12.5})))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT, "{body}");

    let (_, body) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(body["price"], 12.5);
    assert_eq!(body["stock"], 3);

    let (status, _) = app
        .send(
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({"name": "Desk lamp", "description": "LED", "price": 30.0, "stock": 1})),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(
        body,
        json!({"id": id, "name": "Desk lamp", "description": "LED", "price": 30.0, "stock": 1})
    );

    let (status, _) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_requests() {
    let app = TestApp::new();
    let token = app.admin_token();
    let id = create(&app, &token, "Lamp", 3).await;

    let (status, _) = app
        .send(
            Method::PATCH,
            &format!("/products/{id}"),
            Some(&token),
            Some(json!({"id": "other"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(Method::GET, "/products?filter=not-json", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(Method::GET, "/products/missing", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
