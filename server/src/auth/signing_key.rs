//! Process-wide token signing key.
//!
//! # Pre-conditions
//! - The secret is loaded once at startup from configuration.
//!
//! # Post-conditions
//! - `SigningKey` instances are immutable once created.
//!
//! # Invariants
//! - The HS256 secret is never empty.
//! - The secret never appears in `Debug` output.

use jsonwebtoken::{DecodingKey, EncodingKey};

/// Error returned when the signing key is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningKeyError {
    /// The HS256 secret is empty.
    EmptySecret,
}

impl std::fmt::Display for SigningKeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySecret => write!(f, "HS256 secret must not be empty"),
        }
    }
}

impl std::error::Error for SigningKeyError {}

/// HMAC-SHA256 shared secret used both to sign and to verify tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey {
    secret: Vec<u8>,
}

impl SigningKey {
    /// Create an HS256 signing key.
    ///
    /// # Errors
    /// Returns `SigningKeyError::EmptySecret` if the secret is empty.
    pub fn new_hs256(secret: Vec<u8>) -> Result<Self, SigningKeyError> {
        if secret.is_empty() {
            return Err(SigningKeyError::EmptySecret);
        }
        Ok(Self { secret })
    }

    pub(crate) fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.secret)
    }

    pub(crate) fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.secret)
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &"HS256")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_hs256_valid() {
        let key = SigningKey::new_hs256(b"my-secret-key".to_vec()).expect("valid secret");
        assert_eq!(key.secret, b"my-secret-key");
    }

    #[test]
    fn test_new_hs256_empty_secret() {
        let result = SigningKey::new_hs256(Vec::new());
        assert!(matches!(result, Err(SigningKeyError::EmptySecret)));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let key = SigningKey::new_hs256(b"super-secret".to_vec()).expect("valid secret");
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_signing_key_error_display() {
        assert_eq!(
            SigningKeyError::EmptySecret.to_string(),
            "HS256 secret must not be empty"
        );
    }
}
