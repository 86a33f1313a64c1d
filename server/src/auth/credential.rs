//! Credential generation and one-way encryption.
//!
//! A `Credential` is the plaintext password handed to an account owner once.
//! Only its `EncryptedCredential` (an Argon2id PHC string) is ever stored.
//!
//! # Invariants
//! - A `Credential` never appears in `Debug` output and is zeroed on drop.
//! - `verify_credential(c, &encrypt_credential(c)?)` is always `true`.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Number of characters in a generated credential.
pub const CREDENTIAL_LENGTH: usize = 16;

/// Alphabet generated credentials are drawn from.
const CREDENTIAL_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789#$%&*+-=?@";

/// Length of the per-hash random salt in bytes.
const SALT_BYTES: usize = 16;

/// A plaintext credential.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credential(String);

impl Credential {
    /// Wrap a plaintext supplied by a caller, e.g. on login.
    #[must_use]
    pub fn new(plaintext: String) -> Self {
        Self(plaintext)
    }

    /// Borrow the plaintext.
    ///
    /// Only for hashing and out-of-band delivery; never log the result.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// The stored, one-way form of a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedCredential(String);

impl EncryptedCredential {
    /// Wrap a PHC string loaded from storage.
    #[must_use]
    pub const fn from_phc(phc: String) -> Self {
        Self(phc)
    }

    /// The PHC string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Error returned when the one-way transform fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The hashing library reported an internal failure.
    TransformFailed(String),
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TransformFailed(reason) => write!(f, "credential transform failed: {reason}"),
        }
    }
}

impl std::error::Error for CredentialError {}

/// Generate a fresh random credential.
///
/// Draws [`CREDENTIAL_LENGTH`] characters from the thread-local CSPRNG.
#[must_use]
pub fn generate_credential() -> Credential {
    let mut rng = rand::rng();
    let plaintext = (0..CREDENTIAL_LENGTH)
        .map(|_| char::from(CREDENTIAL_ALPHABET[rng.random_range(0..CREDENTIAL_ALPHABET.len())]))
        .collect();
    Credential(plaintext)
}

/// Encrypt a credential with Argon2id and a fresh random salt.
///
/// Two calls with the same plaintext yield different strings; both verify.
pub fn encrypt_credential(credential: &Credential) -> Result<EncryptedCredential, CredentialError> {
    let mut salt_bytes = [0u8; SALT_BYTES];
    rand::rng().fill(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| CredentialError::TransformFailed(e.to_string()))?;

    Argon2::default()
        .hash_password(credential.expose().as_bytes(), &salt)
        .map(|hash| EncryptedCredential(hash.to_string()))
        .map_err(|e| CredentialError::TransformFailed(e.to_string()))
}

/// Verify a plaintext credential against its stored form.
///
/// Returns `false` if the stored value is not a parsable PHC string.
#[must_use]
pub fn verify_credential(credential: &Credential, encrypted: &EncryptedCredential) -> bool {
    let Ok(parsed) = PasswordHash::new(encrypted.as_str()) else {
        return false;
    };

    Argon2::default()
        .verify_password(credential.expose().as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_credential_length_and_alphabet() {
        assert_eq!(CREDENTIAL_ALPHABET.len(), 72);
        let credential = generate_credential();
        assert_eq!(credential.expose().chars().count(), CREDENTIAL_LENGTH);
        assert!(
            credential
                .expose()
                .bytes()
                .all(|b| CREDENTIAL_ALPHABET.contains(&b))
        );
    }

    #[test]
    fn test_generate_credential_is_unique() {
        let first = generate_credential();
        let second = generate_credential();
        assert_ne!(first, second);
    }

    #[test]
    fn test_encrypt_produces_argon2id() {
        let encrypted = encrypt_credential(&generate_credential()).expect("hash");
        assert!(encrypted.as_str().starts_with("$argon2id$"));
    }

    #[test]
    fn test_encrypt_is_salted() {
        let credential = generate_credential();
        let first = encrypt_credential(&credential).expect("hash");
        let second = encrypt_credential(&credential).expect("hash");

        assert_ne!(first, second);
        assert!(verify_credential(&credential, &first));
        assert!(verify_credential(&credential, &second));
    }

    #[test]
    fn test_generated_credential_verifies() {
        let credential = generate_credential();
        let encrypted = encrypt_credential(&credential).expect("hash");
        assert!(verify_credential(&credential, &encrypted));
    }

    #[test]
    fn test_other_credential_does_not_verify() {
        let credential = generate_credential();
        let other = generate_credential();
        let encrypted = encrypt_credential(&credential).expect("hash");
        assert!(!verify_credential(&other, &encrypted));
    }

    #[test]
    fn test_known_plaintext_scenario() {
        let credential = Credential::new("Xk9#mQ2z".to_string());
        let encrypted = encrypt_credential(&credential).expect("hash");

        assert!(verify_credential(&Credential::new("Xk9#mQ2z".to_string()), &encrypted));
        assert!(!verify_credential(&Credential::new("wrongpass".to_string()), &encrypted));
    }

    #[test]
    fn test_verify_rejects_unparsable_hash() {
        let credential = generate_credential();
        let bogus = EncryptedCredential::from_phc("not_a_valid_hash".to_string());
        assert!(!verify_credential(&credential, &bogus));
    }

    #[test]
    fn test_debug_redacts_plaintext() {
        let credential = Credential::new("Xk9#mQ2z".to_string());
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("Xk9#mQ2z"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn test_encrypted_credential_serializes_as_string() {
        let encrypted = EncryptedCredential::from_phc("$argon2id$v=19$abc".to_string());
        let json = serde_json::to_string(&encrypted).expect("serialize");
        assert_eq!(json, "\"$argon2id$v=19$abc\"");
    }
}
