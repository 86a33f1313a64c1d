//! Authentication module.
//!
//! Credential codec, signed tokens, request-admission strategies and the
//! registry that binds strategies to guarded operations.
//!
//! # Pre-conditions
//! - The signing key is configured once at startup.
//! - Every strategy named by a guard is registered before the registry is built.
//!
//! # Post-conditions
//! - A request reaching a guarded handler carries a `Principal`.
//!
//! # Invariants
//! - Plaintext credentials are never persisted or logged.
//! - Callers learn only "missing" or "invalid" for a refused credential.

pub mod credential;
pub mod middleware;
pub mod operation;
pub mod principal;
pub mod registry;
pub mod rejection;
pub mod signing_key;
pub mod strategy;
pub mod token;

pub use credential::{
    Credential, CredentialError, EncryptedCredential, encrypt_credential, generate_credential,
    verify_credential,
};
pub use middleware::{Guard, authenticate};
pub use operation::{Operation, OperationId, Resource};
pub use principal::Principal;
pub use registry::{Admission, RegistryError, StrategyRegistry, StrategyRegistryBuilder};
pub use rejection::{AuthRejection, InvalidReason};
pub use signing_key::{SigningKey, SigningKeyError};
pub use strategy::{AdminStrategy, BearerSource, Strategy, StrategyName, bearer_token};
pub use token::{Claims, IssuedToken, TokenError, TokenRejection, TokenService, TokenSettings};
