//! Person accounts.

use serde::{Deserialize, Serialize};

use crate::auth::{EncryptedCredential, Resource};
use crate::repository::Record;

/// A stored person.
///
/// `password_hash` is set by the account service on creation and is never
/// returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub id: String,
    pub first_names: String,
    pub last_names: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub password_hash: Option<EncryptedCredential>,
}

/// Body accepted when creating or replacing a person.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewPerson {
    pub first_names: String,
    pub last_names: String,
    pub email: String,
    pub phone: String,
}

/// A person as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonView {
    pub id: String,
    pub first_names: String,
    pub last_names: String,
    pub email: String,
    pub phone: String,
}

impl From<Person> for PersonView {
    fn from(person: Person) -> Self {
        Self {
            id: person.id,
            first_names: person.first_names,
            last_names: person.last_names,
            email: person.email,
            phone: person.phone,
        }
    }
}

impl Record for Person {
    type New = NewPerson;
    type View = PersonView;

    const RESOURCE: Resource = Resource::Persons;
    const PROTECTED_FIELDS: &'static [&'static str] = &["id", "password_hash"];
    const UNIQUE_FIELDS: &'static [&'static str] = &["email"];
    const HIDDEN_FIELDS: &'static [&'static str] = &["password_hash"];

    fn from_new(new: NewPerson) -> Self {
        Self {
            id: String::new(),
            first_names: new.first_names,
            last_names: new.last_names,
            email: new.email,
            phone: new.phone,
            password_hash: None,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_view_omits_password_hash() {
        let person = Person {
            id: "abc".to_string(),
            first_names: "Ana".to_string(),
            last_names: "Lopez".to_string(),
            email: "ana@example.com".to_string(),
            phone: "3001234567".to_string(),
            password_hash: Some(EncryptedCredential::from_phc("$argon2id$stub".to_string())),
        };

        let body = serde_json::to_value(PersonView::from(person)).expect("serialize");

        assert_eq!(
            body,
            json!({
                "id": "abc",
                "first_names": "Ana",
                "last_names": "Lopez",
                "email": "ana@example.com",
                "phone": "3001234567",
            })
        );
    }

    #[test]
    fn test_new_person_rejects_credential_fields() {
        let body = json!({
            "first_names": "Ana",
            "last_names": "Lopez",
            "email": "ana@example.com",
            "phone": "3001234567",
            "password_hash": "chosen-by-caller",
        });

        assert!(serde_json::from_value::<NewPerson>(body).is_err());
    }
}
