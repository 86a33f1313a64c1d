//! Authentication rejections.
//!
//! Callers only ever learn whether a credential was missing or invalid. The
//! finer reason for an invalid credential is kept for logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::token::TokenRejection;
use crate::error::error_response;

/// Code returned for any refused credential.
pub const INVALID_CREDENTIAL_CODE: &str = "invalid_credential";

/// Internal reason a presented credential was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// The token service refused the token.
    Token(TokenRejection),
    /// The token verified but names no subject.
    MissingIdentity,
    /// The operation names a strategy that is not registered.
    StrategyUnavailable,
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(rejection) => write!(f, "{rejection}"),
            Self::MissingIdentity => write!(f, "missing-identity"),
            Self::StrategyUnavailable => write!(f, "strategy-unavailable"),
        }
    }
}

/// A refused request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No bearer credential was presented.
    CredentialMissing,
    /// A credential was presented and refused.
    CredentialInvalid(InvalidReason),
}

impl AuthRejection {
    /// Machine-readable code returned to the caller.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::CredentialMissing => "missing_credential",
            Self::CredentialInvalid(_) => INVALID_CREDENTIAL_CODE,
        }
    }

    /// Human-readable message returned to the caller.
    ///
    /// Identical for every `InvalidReason`.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::CredentialMissing => "access denied: no bearer token in request",
            Self::CredentialInvalid(_) => "access denied: bearer token is not valid",
        }
    }
}

impl std::fmt::Display for AuthRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for AuthRejection {}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        error_response(StatusCode::UNAUTHORIZED, self.code(), self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_reasons_share_one_message() {
        let expired =
            AuthRejection::CredentialInvalid(InvalidReason::Token(TokenRejection::Expired));
        let forged =
            AuthRejection::CredentialInvalid(InvalidReason::Token(TokenRejection::BadSignature));
        let anonymous = AuthRejection::CredentialInvalid(InvalidReason::MissingIdentity);

        assert_eq!(expired.message(), forged.message());
        assert_eq!(forged.message(), anonymous.message());
        assert_eq!(expired.code(), "invalid_credential");
        assert!(!expired.to_string().contains("expired"));
    }

    #[test]
    fn test_missing_is_distinct_from_invalid() {
        let missing = AuthRejection::CredentialMissing;
        assert_eq!(missing.code(), "missing_credential");
        let invalid = AuthRejection::CredentialInvalid(InvalidReason::MissingIdentity);
        assert_ne!(missing.message(), invalid.message());
    }

    #[test]
    fn test_rejection_maps_to_unauthorized() {
        let response = AuthRejection::CredentialMissing.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_invalid_reason_display() {
        assert_eq!(
            InvalidReason::Token(TokenRejection::Malformed).to_string(),
            "malformed"
        );
        assert_eq!(InvalidReason::MissingIdentity.to_string(), "missing-identity");
    }
}
