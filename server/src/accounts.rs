//! Account lifecycle: registration and login.
//!
//! # Pre-conditions
//! - The person repository enforces unique emails.
//!
//! # Post-conditions
//! - A created person has a stored `EncryptedCredential`; its plaintext has
//!   only been handed to the notifier.
//! - A successful login yields a token carrying `sub`, `name` and `email`.
//!
//! # Invariants
//! - Plaintext credentials are never stored, logged or returned.
//! - Account creation never waits for notification delivery.

use std::sync::Arc;

use serde_json::Value;
use zeroize::Zeroizing;

use crate::auth::{
    Claims, Credential, CredentialError, IssuedToken, TokenError, TokenService,
    encrypt_credential, generate_credential, verify_credential,
};
use crate::models::{NewPerson, Person};
use crate::notify::Notifier;
use crate::repository::{Record, Repository, RepositoryError, Where};

/// Subject of the registration email.
pub const REGISTRATION_SUBJECT: &str = "Platform registration";

/// Error returned by account operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    Credential(CredentialError),
    Repository(RepositoryError),
    Token(TokenError),
    /// Unknown email or wrong password.
    InvalidLogin,
}

impl std::fmt::Display for AccountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Credential(e) => write!(f, "{e}"),
            Self::Repository(e) => write!(f, "{e}"),
            Self::Token(e) => write!(f, "{e}"),
            Self::InvalidLogin => write!(f, "invalid login"),
        }
    }
}

impl std::error::Error for AccountError {}

impl From<CredentialError> for AccountError {
    fn from(error: CredentialError) -> Self {
        Self::Credential(error)
    }
}

impl From<RepositoryError> for AccountError {
    fn from(error: RepositoryError) -> Self {
        Self::Repository(error)
    }
}

impl From<TokenError> for AccountError {
    fn from(error: TokenError) -> Self {
        Self::Token(error)
    }
}

/// Creates accounts and logs people in.
pub struct AccountService {
    persons: Arc<dyn Repository<Person>>,
    tokens: Arc<TokenService>,
    notifier: Arc<dyn Notifier>,
}

impl AccountService {
    #[must_use]
    pub fn new(
        persons: Arc<dyn Repository<Person>>,
        tokens: Arc<TokenService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            persons,
            tokens,
            notifier,
        }
    }

    /// Register a person with a generated credential.
    ///
    /// The credential is encrypted before the person is stored, then sent to
    /// the person by email and SMS. CPU-bound; call from a blocking context.
    pub fn create_account(&self, new: NewPerson) -> Result<Person, AccountError> {
        let credential = generate_credential();
        let mut person = Person::from_new(new);
        person.password_hash = Some(encrypt_credential(&credential)?);

        let person = self.persons.create(person)?;

        let message = Zeroizing::new(registration_message(&person, &credential));
        self.notifier
            .send_email(&person.email, REGISTRATION_SUBJECT, &message);
        self.notifier.send_sms(&person.phone, &message);

        tracing::info!(id = %person.id, "account created");
        Ok(person)
    }

    /// Check an email and password pair and issue a session token.
    ///
    /// CPU-bound; call from a blocking context.
    pub fn login(&self, email: &str, credential: &Credential) -> Result<IssuedToken, AccountError> {
        let person = self
            .persons
            .find_one(&Where::field_eq("email", email))?
            .filter(|person| {
                person
                    .password_hash
                    .as_ref()
                    .is_some_and(|stored| verify_credential(credential, stored))
            });

        let Some(person) = person else {
            tracing::warn!("login refused");
            return Err(AccountError::InvalidLogin);
        };

        let issued = self.tokens.issue_default(session_claims(&person))?;
        tracing::info!(id = %person.id, "login succeeded");
        Ok(issued)
    }
}

fn registration_message(person: &Person, credential: &Credential) -> String {
    format!(
        "Hello {}, your username is {} and your password is {}",
        person.first_names,
        person.email,
        credential.expose()
    )
}

fn session_claims(person: &Person) -> Claims {
    let mut claims = Claims::new();
    claims.insert("sub".to_string(), Value::String(person.id.clone()));
    claims.insert(
        "name".to_string(),
        Value::String(format!("{} {}", person.first_names, person.last_names)),
    );
    claims.insert("email".to_string(), Value::String(person.email.clone()));
    claims
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SigningKey;
    use crate::auth::token::TokenSettings;
    use crate::notify::recording::{Notification, RecordingNotifier};
    use crate::repository::InMemoryRepository;
    use crate::time::ManualTimeSource;

    struct Fixture {
        accounts: AccountService,
        persons: Arc<InMemoryRepository<Person>>,
        notifier: Arc<RecordingNotifier>,
        tokens: Arc<TokenService>,
    }

    fn fixture() -> Fixture {
        let key = SigningKey::new_hs256(b"accounts-test-secret".to_vec()).expect("valid secret");
        let tokens = Arc::new(TokenService::with_clock(
            &key,
            TokenSettings::default(),
            Arc::new(ManualTimeSource::default_start()),
        ));
        let persons = Arc::new(InMemoryRepository::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let accounts = AccountService::new(
            Arc::clone(&persons) as Arc<dyn Repository<Person>>,
            Arc::clone(&tokens),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );
        Fixture {
            accounts,
            persons,
            notifier,
            tokens,
        }
    }

    fn ana() -> NewPerson {
        NewPerson {
            first_names: "Ana".to_string(),
            last_names: "Lopez".to_string(),
            email: "ana@example.com".to_string(),
            phone: "3001234567".to_string(),
        }
    }

    /// The plaintext credential delivered by email.
    fn delivered_credential(notifier: &RecordingNotifier) -> String {
        notifier
            .sent()
            .into_iter()
            .find_map(|notification| match notification {
                Notification::Email { body, .. } => body
                    .rsplit(' ')
                    .next()
                    .map(str::to_string),
                Notification::Sms { .. } => None,
            })
            .expect("registration email")
    }

    #[test]
    fn test_create_account_stores_only_encrypted_credential() {
        let fixture = fixture();

        let person = fixture.accounts.create_account(ana()).expect("created");

        let stored = fixture.persons.find_by_id(&person.id).expect("stored");
        let hash = stored.password_hash.expect("hash stored");
        let plaintext = delivered_credential(&fixture.notifier);
        assert_ne!(hash.as_str(), plaintext);
        assert!(verify_credential(&Credential::new(plaintext), &hash));
    }

    #[test]
    fn test_create_account_notifies_by_email_and_sms() {
        let fixture = fixture();

        fixture.accounts.create_account(ana()).expect("created");

        let sent = fixture.notifier.sent();
        assert_eq!(sent.len(), 2);
        let Notification::Email {
            destination,
            subject,
            body,
        } = &sent[0]
        else {
            panic!("expected email first, got {:?}", sent[0]);
        };
        assert_eq!(destination, "ana@example.com");
        assert_eq!(subject, REGISTRATION_SUBJECT);
        assert!(body.starts_with("Hello Ana, your username is ana@example.com"));
        assert_eq!(
            sent[1],
            Notification::Sms {
                phone: "3001234567".to_string(),
                body: body.clone(),
            }
        );
    }

    #[test]
    fn test_duplicate_email_is_conflict_and_not_notified() {
        let fixture = fixture();
        fixture.accounts.create_account(ana()).expect("created");

        let result = fixture.accounts.create_account(ana());

        assert!(matches!(
            result,
            Err(AccountError::Repository(RepositoryError::Conflict { .. }))
        ));
        assert_eq!(fixture.notifier.sent().len(), 2);
    }

    #[test]
    fn test_login_with_delivered_credential() {
        let fixture = fixture();
        let person = fixture.accounts.create_account(ana()).expect("created");
        let plaintext = delivered_credential(&fixture.notifier);

        let issued = fixture
            .accounts
            .login("ana@example.com", &Credential::new(plaintext))
            .expect("login");

        let claims = fixture.tokens.validate(&issued.token).expect("valid token");
        assert_eq!(claims["sub"], person.id.as_str());
        assert_eq!(claims["name"], "Ana Lopez");
        assert_eq!(claims["email"], "ana@example.com");
    }

    #[test]
    fn test_login_failures_are_indistinguishable() {
        let fixture = fixture();
        fixture.accounts.create_account(ana()).expect("created");

        let wrong = Credential::new("wrongpass".to_string());

        assert!(matches!(
            fixture.accounts.login("ana@example.com", &wrong),
            Err(AccountError::InvalidLogin)
        ));
        assert!(matches!(
            fixture.accounts.login("nobody@example.com", &wrong),
            Err(AccountError::InvalidLogin)
        ));
    }
}
