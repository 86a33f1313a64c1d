//! Common helpers for end-to-end tests.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::accounts::AccountService;
use crate::auth::{Claims, SigningKey, TokenService, TokenSettings};
use crate::models::{Person, Product};
use crate::notify::Notifier;
use crate::notify::recording::{Notification, RecordingNotifier};
use crate::repository::{InMemoryRepository, Repository};
use crate::routes::{self, AppState};
use crate::time::{ManualTimeSource, TimeSource};

pub const HOUR_MS: u64 = 3_600_000;

/// A fully wired application with a manual clock and recorded notifications.
pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualTimeSource>,
    pub tokens: Arc<TokenService>,
    pub persons: Arc<InMemoryRepository<Person>>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let clock = Arc::new(ManualTimeSource::default_start());
        let key = SigningKey::new_hs256(b"e2e-test-signing-secret".to_vec()).expect("valid secret");
        let settings = TokenSettings {
            default_ttl: Duration::from_secs(3600),
            leeway: Duration::ZERO,
        };
        let tokens = Arc::new(TokenService::with_clock(
            &key,
            settings,
            Arc::clone(&clock) as Arc<dyn TimeSource>,
        ));

        let persons = Arc::new(InMemoryRepository::new());
        let products: Arc<dyn Repository<Product>> = Arc::new(InMemoryRepository::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let accounts = Arc::new(AccountService::new(
            Arc::clone(&persons) as Arc<dyn Repository<Person>>,
            Arc::clone(&tokens),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        ));

        let registry =
            Arc::new(routes::default_registry(Arc::clone(&tokens)).expect("valid registry"));
        let router = routes::router(
            AppState {
                persons: Arc::clone(&persons) as Arc<dyn Repository<Person>>,
                products,
                accounts,
            },
            &registry,
        );

        Self {
            router,
            clock,
            tokens,
            persons,
            notifier,
        }
    }

    /// A token for an administrator, valid for the default lifetime.
    pub fn admin_token(&self) -> String {
        let mut claims = Claims::new();
        claims.insert("sub".to_string(), json!("admin-1"));
        claims.insert("name".to_string(), json!("Admin"));
        self.tokens.issue_default(claims).expect("issue").token
    }

    /// Send a request and return the status and JSON body (`Null` if empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible router");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }

    /// Register a person through the API and return the created body.
    pub async fn sign_up(&self, first_names: &str, email: &str) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                "/persons",
                None,
                Some(json!({
                    "first_names": first_names,
                    "last_names": "Tester",
                    "email": email,
                    "phone": "3001234567",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }

    /// The plaintext credential in the most recent registration email to `email`.
    pub fn delivered_credential(&self, email: &str) -> String {
        self.notifier
            .sent()
            .into_iter()
            .rev()
            .find_map(|notification| match notification {
                Notification::Email {
                    destination, body, ..
                } if destination == email => body.rsplit(' ').next().map(str::to_string),
                _ => None,
            })
            .expect("registration email")
    }
}

/// Percent-encode a JSON value for use in a query string.
pub fn query_json(value: &Value) -> String {
    value
        .to_string()
        .bytes()
        .fold(String::new(), |mut encoded, byte| {
            if byte.is_ascii_alphanumeric() || b"-_.~".contains(&byte) {
                encoded.push(char::from(byte));
            } else {
                let _ = write!(encoded, "%{byte:02X}");
            }
            encoded
        })
}

/// Assert a 401 response with the given error code.
pub fn assert_unauthorized(status: StatusCode, body: &Value, code: &str) {
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{body}");
    assert_eq!(body["error"]["code"], code, "{body}");
}
