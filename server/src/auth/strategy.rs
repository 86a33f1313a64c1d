//! Authentication strategies.
//!
//! A strategy decides whether an inbound request is admitted. Strategies are
//! a closed set: each variant of [`Strategy`] has a fixed [`StrategyName`].
//!
//! # Invariants
//! - `authenticate` has no side effects beyond logging.
//! - Identical (request, time, key) inputs always yield the same decision.

use std::fmt;
use std::sync::Arc;

use axum::http::{HeaderMap, header};

use super::principal::Principal;
use super::rejection::{AuthRejection, InvalidReason};
use super::token::TokenService;

/// Name a strategy is bound by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyName {
    Admin,
}

impl StrategyName {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything a bearer credential can be read from.
pub trait BearerSource {
    /// The raw `Authorization` header value, if present and valid UTF-8.
    fn authorization(&self) -> Option<&str>;
}

impl BearerSource for HeaderMap {
    fn authorization(&self) -> Option<&str> {
        self.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok())
    }
}

/// Extract the token from a `Bearer <token>` authorization header.
///
/// The scheme is matched case-insensitively. Any other scheme, or an empty
/// token, counts as no bearer credential.
#[must_use]
pub fn bearer_token<R: BearerSource + ?Sized>(request: &R) -> Option<&str> {
    let (scheme, token) = request.authorization()?.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Admits any request carrying a valid, unexpired token.
pub struct AdminStrategy {
    tokens: Arc<TokenService>,
}

impl AdminStrategy {
    #[must_use]
    pub const fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    fn authenticate<R: BearerSource + ?Sized>(
        &self,
        request: &R,
    ) -> Result<Principal, AuthRejection> {
        let Some(token) = bearer_token(request) else {
            tracing::warn!(strategy = "admin", "authentication failed: no bearer token");
            return Err(AuthRejection::CredentialMissing);
        };

        let claims = self.tokens.validate(token).map_err(|rejection| {
            tracing::warn!(
                strategy = "admin",
                reason = %rejection,
                "authentication failed: invalid token"
            );
            AuthRejection::CredentialInvalid(InvalidReason::Token(rejection))
        })?;

        Principal::from_claims(StrategyName::Admin, claims).ok_or_else(|| {
            tracing::warn!(
                strategy = "admin",
                reason = "missing-identity",
                "authentication failed: invalid token"
            );
            AuthRejection::CredentialInvalid(InvalidReason::MissingIdentity)
        })
    }
}

/// A request-admission strategy.
pub enum Strategy {
    Admin(AdminStrategy),
}

impl Strategy {
    /// The name this strategy is bound by.
    #[must_use]
    pub const fn name(&self) -> StrategyName {
        match self {
            Self::Admin(_) => StrategyName::Admin,
        }
    }

    /// Decide admission for a request.
    pub fn authenticate<R: BearerSource + ?Sized>(
        &self,
        request: &R,
    ) -> Result<Principal, AuthRejection> {
        match self {
            Self::Admin(strategy) => strategy.authenticate(request),
        }
    }
}
