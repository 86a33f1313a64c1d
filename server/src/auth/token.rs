//! Signed session tokens.
//!
//! Issues and validates HS256 JSON Web Tokens whose payload is a free-form
//! claim map plus `iat` and `exp` timestamps in Unix seconds.
//!
//! # Pre-conditions
//! - A `TokenService` can only be built from a valid `SigningKey`.
//!
//! # Post-conditions
//! - `validate(issue(claims)?.token)` returns exactly `claims` until expiry.
//!
//! # Invariants
//! - Validation is a pure function of (token, current time, signing key).
//! - The signature is always recomputed; payload contents are never trusted
//!   before it matches.
//! - The clock-skew leeway applies to the expiry check only.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::SigningKey;
use crate::time::{SystemTimeSource, TimeSource};

/// Custom claims carried by a token, keyed by claim name.
pub type Claims = Map<String, Value>;

/// Claim names managed by the service itself.
const RESERVED_CLAIMS: &[&str] = &["iat", "exp"];

/// Wire payload: the caller's claims flattened next to the timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenPayload {
    iat: u64,
    exp: u64,
    #[serde(flatten)]
    claims: Claims,
}

/// Lifetime settings for issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSettings {
    /// Lifetime used by [`TokenService::issue_default`].
    pub default_ttl: Duration,
    /// Tolerated clock skew when checking expiry.
    pub leeway: Duration,
}

impl TokenSettings {
    /// Default token lifetime.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            default_ttl: Self::DEFAULT_TTL,
            leeway: Duration::ZERO,
        }
    }
}

/// A freshly minted token and its validity window.
#[derive(Clone, Serialize)]
pub struct IssuedToken {
    /// The encoded `header.payload.signature` string.
    pub token: String,
    /// Issue time in Unix seconds.
    pub issued_at: u64,
    /// Expiry time in Unix seconds.
    pub expires_at: u64,
}

/// Error returned when a token cannot be issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The caller supplied a claim the service sets itself.
    ReservedClaim(String),
    /// The JWT library failed to encode or sign the token.
    Encoding(String),
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReservedClaim(name) => write!(f, "claim '{name}' is reserved"),
            Self::Encoding(reason) => write!(f, "failed to encode token: {reason}"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Why a token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    /// The token could not be parsed.
    Malformed,
    /// The signature does not match the header and payload.
    BadSignature,
    /// The current time is past the embedded expiry.
    Expired,
}

impl TokenRejection {
    /// Short tag used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::BadSignature => "bad-signature",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for TokenRejection {}

/// Issues and validates tokens with the process-wide signing key.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    settings: TokenSettings,
    clock: Arc<dyn TimeSource>,
}

impl TokenService {
    /// Create a token service reading the system clock.
    #[must_use]
    pub fn new(key: &SigningKey, settings: TokenSettings) -> Self {
        Self::with_clock(key, settings, Arc::new(SystemTimeSource))
    }

    /// Create a token service reading the given clock.
    #[must_use]
    pub fn with_clock(
        key: &SigningKey,
        settings: TokenSettings,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against `clock` in `validate_at`.
        validation.validate_exp = false;
        // Claims are free-form; registered names carry no extra meaning.
        validation.validate_aud = false;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();
        validation.leeway = 0;

        Self {
            encoding_key: key.encoding_key(),
            decoding_key: key.decoding_key(),
            validation,
            settings,
            clock,
        }
    }

    /// Issue a token carrying `claims` that expires `ttl` from now.
    ///
    /// # Errors
    /// Returns `TokenError::ReservedClaim` if `claims` contains `iat` or `exp`.
    pub fn issue(&self, claims: Claims, ttl: Duration) -> Result<IssuedToken, TokenError> {
        if let Some(name) = RESERVED_CLAIMS.iter().find(|name| claims.contains_key(**name)) {
            return Err(TokenError::ReservedClaim((*name).to_string()));
        }

        let issued_at = self.clock.now_secs();
        let expires_at = issued_at.saturating_add(ttl.as_secs());
        let payload = TokenPayload {
            iat: issued_at,
            exp: expires_at,
            claims,
        };

        let token = encode(&Header::new(Algorithm::HS256), &payload, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok(IssuedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    /// Issue a token with the configured default lifetime.
    pub fn issue_default(&self, claims: Claims) -> Result<IssuedToken, TokenError> {
        self.issue(claims, self.settings.default_ttl)
    }

    /// Validate a token against the current time.
    pub fn validate(&self, raw: &str) -> Result<Claims, TokenRejection> {
        self.validate_at(raw, self.clock.now_secs())
    }

    /// Validate a token as of `now_secs`.
    ///
    /// Checks run in order: structure, signature, expiry. The first failure
    /// is returned.
    pub fn validate_at(&self, raw: &str, now_secs: u64) -> Result<Claims, TokenRejection> {
        let data = decode::<TokenPayload>(raw, &self.decoding_key, &self.validation)
            .map_err(map_jwt_error)?;
        let payload = data.claims;

        if now_secs > payload.exp.saturating_add(self.settings.leeway.as_secs()) {
            return Err(TokenRejection::Expired);
        }

        Ok(payload.claims)
    }
}

/// Maps jsonwebtoken errors to a rejection reason.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> TokenRejection {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => TokenRejection::BadSignature,
        ErrorKind::ExpiredSignature => TokenRejection::Expired,
        _ => TokenRejection::Malformed,
    }
}
