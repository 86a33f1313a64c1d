//! HTTP-facing errors.
//!
//! Every failure a handler can return is mapped to a status code and a JSON
//! body of the form `{"error":{"code":..,"message":..}}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::accounts::AccountError;
use crate::auth::rejection::INVALID_CREDENTIAL_CODE;
use crate::auth::{CredentialError, TokenError};
use crate::repository::RepositoryError;

/// Message returned for every failed login.
const LOGIN_FAILED_MESSAGE: &str = "access denied: email or password is incorrect";

/// Build the standard error response.
#[must_use]
pub fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    let body = json!({
        "error": {
            "code": code,
            "message": message,
        }
    });
    (status, Json(body)).into_response()
}

/// Error returned by request handlers.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    /// Unknown email or wrong password. Deliberately indistinguishable.
    LoginFailed,
    /// Detail is logged, never returned.
    Internal(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(message) | Self::BadRequest(message) | Self::Conflict(message) => {
                f.write_str(message)
            }
            Self::LoginFailed => f.write_str(LOGIN_FAILED_MESSAGE),
            Self::Internal(detail) => write!(f, "internal error: {detail}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(message) => error_response(StatusCode::NOT_FOUND, "not_found", &message),
            Self::BadRequest(message) => {
                error_response(StatusCode::BAD_REQUEST, "bad_request", &message)
            }
            Self::Conflict(message) => error_response(StatusCode::CONFLICT, "conflict", &message),
            Self::LoginFailed => error_response(
                StatusCode::UNAUTHORIZED,
                INVALID_CREDENTIAL_CODE,
                LOGIN_FAILED_MESSAGE,
            ),
            Self::Internal(detail) => {
                tracing::error!(%detail, "request failed");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "internal server error",
                )
            }
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound(_) => Self::NotFound(error.to_string()),
            RepositoryError::Conflict { .. } => Self::Conflict(error.to_string()),
            RepositoryError::InvalidPatch(_) | RepositoryError::InvalidFilter(_) => {
                Self::BadRequest(error.to_string())
            }
            RepositoryError::Serialization(_) | RepositoryError::LockPoisoned => {
                Self::Internal(error.to_string())
            }
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(error: CredentialError) -> Self {
        Self::Internal(error.to_string())
    }
}

impl From<TokenError> for ApiError {
    fn from(error: TokenError) -> Self {
        Self::Internal(error.to_string())
    }
}

impl From<AccountError> for ApiError {
    fn from(error: AccountError) -> Self {
        match error {
            AccountError::Credential(error) => error.into(),
            AccountError::Repository(error) => error.into(),
            AccountError::Token(error) => error.into(),
            AccountError::InvalidLogin => Self::LoginFailed,
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::Internal(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::Value;

    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::NotFound("no record with id 'x'".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({"error": {"code": "not_found", "message": "no record with id 'x'"}})
        );
    }

    #[test]
    fn test_repository_error_status_mapping() {
        let cases = [
            (RepositoryError::NotFound("x".to_string()), StatusCode::NOT_FOUND),
            (
                RepositoryError::Conflict {
                    field: "email".to_string(),
                },
                StatusCode::CONFLICT,
            ),
            (RepositoryError::InvalidPatch("x".to_string()), StatusCode::BAD_REQUEST),
            (RepositoryError::InvalidFilter("x".to_string()), StatusCode::BAD_REQUEST),
            (RepositoryError::LockPoisoned, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError::from(error).into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_internal_detail_is_not_returned() {
        let response =
            ApiError::from(CredentialError::TransformFailed("salt failure".to_string()))
                .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "internal server error");
    }

    #[tokio::test]
    async fn test_login_failure_uses_invalid_credential_code() {
        let response = ApiError::LoginFailed.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"]["code"], "invalid_credential");
    }
}
