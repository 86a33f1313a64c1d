//! In-memory repository backed by a `RwLock`.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{Map, Value};

use super::{Filter, Patch, Record, Repository, RepositoryError, Where, to_object};

/// Bytes of randomness in a generated record id (rendered as hex).
const ID_BYTES: usize = 12;

/// Records of one resource held in insertion order.
pub struct InMemoryRepository<T> {
    records: RwLock<Vec<T>>,
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Record> InMemoryRepository<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<T>>, RepositoryError> {
        self.records.read().map_err(|_| RepositoryError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<T>>, RepositoryError> {
        self.records.write().map_err(|_| RepositoryError::LockPoisoned)
    }

    fn position(records: &[T], id: &str) -> Result<usize, RepositoryError> {
        records
            .iter()
            .position(|record| record.id() == id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    /// Records matching `conditions`, with their index.
    fn matching<'a>(
        records: &'a [T],
        conditions: &Where,
    ) -> Result<Vec<(usize, &'a T)>, RepositoryError> {
        conditions.check::<T>()?;
        let mut matched = Vec::new();
        for (index, record) in records.iter().enumerate() {
            if conditions.matches(&to_object(record)?) {
                matched.push((index, record));
            }
        }
        Ok(matched)
    }

    /// Verify unique fields stay distinct if `changes` replace the records
    /// at their indexes (an index equal to `records.len()` appends).
    fn check_unique(records: &[T], changes: &[(usize, T)]) -> Result<(), RepositoryError> {
        if T::UNIQUE_FIELDS.is_empty() {
            return Ok(());
        }

        let mut objects: Vec<Map<String, Value>> =
            records.iter().map(to_object).collect::<Result<_, _>>()?;
        for (index, record) in changes {
            let object = to_object(record)?;
            if *index < objects.len() {
                objects[*index] = object;
            } else {
                objects.push(object);
            }
        }

        for field in T::UNIQUE_FIELDS {
            let mut seen = HashSet::new();
            let taken = objects
                .iter()
                .filter_map(|object| object.get(*field))
                .filter(|value| !value.is_null())
                .any(|value| !seen.insert(value.to_string()));
            if taken {
                return Err(RepositoryError::Conflict {
                    field: (*field).to_string(),
                });
            }
        }
        Ok(())
    }

    /// Copy protected fields from `stored` into `replacement`.
    fn keep_protected(stored: &T, replacement: &T) -> Result<T, RepositoryError> {
        let stored = to_object(stored)?;
        let mut object = to_object(replacement)?;
        for field in T::PROTECTED_FIELDS {
            match stored.get(*field) {
                Some(value) => object.insert((*field).to_string(), value.clone()),
                None => object.remove(*field),
            };
        }
        serde_json::from_value(Value::Object(object))
            .map_err(|e| RepositoryError::Serialization(e.to_string()))
    }
}

impl<T: Record> Repository<T> for InMemoryRepository<T> {
    fn create(&self, mut record: T) -> Result<T, RepositoryError> {
        record.set_id(generate_id());
        let mut records = self.write()?;
        Self::check_unique(&records, &[(records.len(), record.clone())])?;
        records.push(record.clone());
        tracing::debug!(resource = T::RESOURCE.as_str(), id = record.id(), "record created");
        Ok(record)
    }

    fn count(&self, conditions: &Where) -> Result<usize, RepositoryError> {
        let records = self.read()?;
        Ok(Self::matching(&records, conditions)?.len())
    }

    fn find(&self, filter: &Filter) -> Result<Vec<T>, RepositoryError> {
        let records = self.read()?;
        Ok(Self::matching(&records, &filter.conditions)?
            .into_iter()
            .skip(filter.skip.unwrap_or(0))
            .take(filter.limit.unwrap_or(usize::MAX))
            .map(|(_, record)| record.clone())
            .collect())
    }

    fn find_one(&self, conditions: &Where) -> Result<Option<T>, RepositoryError> {
        let records = self.read()?;
        Ok(Self::matching(&records, conditions)?
            .first()
            .map(|(_, record)| (*record).clone()))
    }

    fn update_all(&self, conditions: &Where, patch: &Patch) -> Result<usize, RepositoryError> {
        let mut records = self.write()?;
        let changes = Self::matching(&records, conditions)?
            .into_iter()
            .map(|(index, record)| Ok((index, patch.apply(record)?)))
            .collect::<Result<Vec<_>, RepositoryError>>()?;
        Self::check_unique(&records, &changes)?;

        let count = changes.len();
        for (index, record) in changes {
            records[index] = record;
        }
        tracing::debug!(resource = T::RESOURCE.as_str(), count, "records updated");
        Ok(count)
    }

    fn find_by_id(&self, id: &str) -> Result<T, RepositoryError> {
        let records = self.read()?;
        let index = Self::position(&records, id)?;
        Ok(records[index].clone())
    }

    fn update_by_id(&self, id: &str, patch: &Patch) -> Result<(), RepositoryError> {
        let mut records = self.write()?;
        let index = Self::position(&records, id)?;
        let updated = patch.apply(&records[index])?;
        Self::check_unique(&records, &[(index, updated.clone())])?;
        records[index] = updated;
        Ok(())
    }

    fn replace_by_id(&self, id: &str, record: T) -> Result<(), RepositoryError> {
        let mut records = self.write()?;
        let index = Self::position(&records, id)?;
        let replacement = Self::keep_protected(&records[index], &record)?;
        Self::check_unique(&records, &[(index, replacement.clone())])?;
        records[index] = replacement;
        Ok(())
    }

    fn delete_by_id(&self, id: &str) -> Result<(), RepositoryError> {
        let mut records = self.write()?;
        let index = Self::position(&records, id)?;
        records.remove(index);
        tracing::debug!(resource = T::RESOURCE.as_str(), id, "record deleted");
        Ok(())
    }
}

/// A random 24-character hex id.
fn generate_id() -> String {
    let bytes: [u8; ID_BYTES] = rand::random();
    bytes
        .iter()
        .fold(String::with_capacity(ID_BYTES * 2), |mut id, byte| {
            let _ = write!(id, "{byte:02x}");
            id
        })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::auth::EncryptedCredential;
    use crate::models::{Person, Product};

    fn product(name: &str, stock: u32) -> Product {
        Product {
            id: String::new(),
            name: name.to_string(),
            description: None,
            price: 10.0,
            stock,
        }
    }

    fn person(email: &str) -> Person {
        Person {
            id: String::new(),
            first_names: "Ana".to_string(),
            last_names: "Lopez".to_string(),
            email: email.to_string(),
            phone: "3001234567".to_string(),
            password_hash: None,
        }
    }

    fn patch(value: Value) -> Patch {
        match value {
            Value::Object(map) => Patch::new(map),
            _ => panic!("patch must be an object"),
        }
    }

    #[test]
    fn test_create_assigns_distinct_hex_ids() {
        let repository = InMemoryRepository::new();

        let first = repository.create(product("Lamp", 1)).expect("create");
        let second = repository.create(product("Desk", 1)).expect("create");

        assert_eq!(first.id.len(), 24);
        assert!(first.id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first.id, second.id);
        assert_eq!(repository.find_by_id(&first.id), Ok(first));
    }

    #[test]
    fn test_count_and_find_with_pagination() {
        let repository = InMemoryRepository::new();
        for (name, stock) in [("a", 0), ("b", 5), ("c", 0), ("d", 0)] {
            repository.create(product(name, stock)).expect("create");
        }

        assert_eq!(repository.count(&Where::default()), Ok(4));
        assert_eq!(repository.count(&Where::field_eq("stock", 0)), Ok(3));

        let filter = Filter {
            conditions: Where::field_eq("stock", 0),
            limit: Some(1),
            skip: Some(1),
        };
        let found = repository.find(&filter).expect("find");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "c");
    }

    #[test]
    fn test_update_all_patches_matching_records() {
        let repository = InMemoryRepository::new();
        repository.create(product("a", 0)).expect("create");
        repository.create(product("b", 5)).expect("create");

        let count = repository
            .update_all(&Where::field_eq("stock", 0), &patch(json!({"stock": 9})))
            .expect("update");

        assert_eq!(count, 1);
        assert_eq!(repository.count(&Where::field_eq("stock", 9)), Ok(1));
        assert_eq!(repository.count(&Where::field_eq("stock", 5)), Ok(1));
    }

    #[test]
    fn test_integer_price_matches_stored_float() {
        let repository = InMemoryRepository::new();
        let mut lamp = product("Lamp", 1);
        lamp.price = 20.0;
        repository.create(lamp).expect("create");
        repository.create(product("Desk", 1)).expect("create");

        assert_eq!(repository.count(&Where::field_eq("price", 20)), Ok(1));
        assert_eq!(repository.count(&Where::field_eq("price", 20.0)), Ok(1));
        assert_eq!(repository.count(&Where::field_eq("price", 20.5)), Ok(0));

        let filter = Filter {
            conditions: Where::field_eq("price", 20),
            ..Filter::default()
        };
        let found = repository.find(&filter).expect("find");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Lamp");

        let updated = repository
            .update_all(&Where::field_eq("price", 20), &patch(json!({"stock": 3})))
            .expect("update");
        assert_eq!(updated, 1);
        assert_eq!(repository.count(&Where::field_eq("stock", 3)), Ok(1));
    }

    #[test]
    fn test_missing_ids_are_not_found() {
        let repository: InMemoryRepository<Product> = InMemoryRepository::new();

        assert_eq!(
            repository.find_by_id("nope"),
            Err(RepositoryError::NotFound("nope".to_string()))
        );
        assert!(repository.delete_by_id("nope").is_err());
        assert!(repository.update_by_id("nope", &Patch::default()).is_err());
        assert!(repository.replace_by_id("nope", product("x", 1)).is_err());
    }

    #[test]
    fn test_delete_removes_record() {
        let repository = InMemoryRepository::new();
        let created = repository.create(product("a", 1)).expect("create");

        repository.delete_by_id(&created.id).expect("delete");

        assert_eq!(repository.count(&Where::default()), Ok(0));
    }

    #[test]
    fn test_replace_keeps_protected_fields() {
        let repository = InMemoryRepository::new();
        let mut stored = person("ana@example.com");
        stored.password_hash = Some(EncryptedCredential::from_phc("$argon2id$stub".to_string()));
        let created = repository.create(stored).expect("create");

        let mut replacement = person("ana.lopez@example.com");
        replacement.id = "forged".to_string();
        repository
            .replace_by_id(&created.id, replacement)
            .expect("replace");

        let reloaded = repository.find_by_id(&created.id).expect("find");
        assert_eq!(reloaded.email, "ana.lopez@example.com");
        assert_eq!(reloaded.password_hash, created.password_hash);
        assert_eq!(reloaded.id, created.id);
    }

    #[test]
    fn test_unique_email_is_enforced() {
        let repository = InMemoryRepository::new();
        let ana = repository.create(person("ana@example.com")).expect("create");
        let bea = repository.create(person("bea@example.com")).expect("create");

        assert_eq!(
            repository.create(person("ana@example.com")).err(),
            Some(RepositoryError::Conflict {
                field: "email".to_string()
            })
        );
        assert!(matches!(
            repository.update_by_id(&bea.id, &patch(json!({"email": "ana@example.com"}))),
            Err(RepositoryError::Conflict { .. })
        ));
        assert!(matches!(
            repository.update_all(&Where::default(), &patch(json!({"email": "same@example.com"}))),
            Err(RepositoryError::Conflict { .. })
        ));
        assert_eq!(repository.find_by_id(&ana.id).expect("find").email, "ana@example.com");
        assert_eq!(repository.count(&Where::default()), Ok(2));
    }
}
