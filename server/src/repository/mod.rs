//! Record persistence.
//!
//! A `Repository<T>` stores records of one resource and answers the eight
//! CRUD operations over them. Queries are JSON field-equality constraints;
//! updates are JSON patches merged over the stored record.
//!
//! # Invariants
//! - `Record::PROTECTED_FIELDS` are never changed by a patch or a replace.
//! - `Record::UNIQUE_FIELDS` hold distinct non-null values across all records.
//! - `Record::HIDDEN_FIELDS` cannot be used as filter keys.

pub mod memory;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::Resource;

pub use memory::InMemoryRepository;

/// A stored resource record.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Body accepted on create and replace (no `id`).
    type New: DeserializeOwned + Send;
    /// Representation returned to callers.
    type View: Serialize + From<Self> + Send;

    /// Resource this record belongs to.
    const RESOURCE: Resource;
    /// Fields a patch or a replace never changes.
    const PROTECTED_FIELDS: &'static [&'static str] = &["id"];
    /// Fields whose non-null values must be distinct across records.
    const UNIQUE_FIELDS: &'static [&'static str] = &[];
    /// Fields that cannot be queried on.
    const HIDDEN_FIELDS: &'static [&'static str] = &[];

    fn from_new(new: Self::New) -> Self;
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
}

/// Error returned by repository operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// No record has the given id.
    NotFound(String),
    /// A unique field value is already taken.
    Conflict { field: String },
    /// A patch is not applicable to the record type.
    InvalidPatch(String),
    /// A `where` or `filter` query is malformed.
    InvalidFilter(String),
    /// A record failed to convert to or from JSON.
    Serialization(String),
    /// The storage lock was poisoned by a panicking writer.
    LockPoisoned,
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "no record with id '{id}'"),
            Self::Conflict { field } => write!(f, "value of '{field}' is already taken"),
            Self::InvalidPatch(message) => write!(f, "invalid patch: {message}"),
            Self::InvalidFilter(message) => write!(f, "invalid filter: {message}"),
            Self::Serialization(message) => write!(f, "serialization failed: {message}"),
            Self::LockPoisoned => write!(f, "storage lock poisoned"),
        }
    }
}

impl std::error::Error for RepositoryError {}

/// Field-equality constraints. An empty `Where` matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Where(Map<String, Value>);

impl Where {
    /// Constrain `field` to equal `value`.
    #[must_use]
    pub fn field_eq(field: &str, value: impl Into<Value>) -> Self {
        let mut map = Map::new();
        map.insert(field.to_string(), value.into());
        Self(map)
    }

    /// Parse the `where` query parameter. Absent means match all.
    pub fn parse(raw: Option<&str>) -> Result<Self, RepositoryError> {
        raw.map_or_else(
            || Ok(Self::default()),
            |raw| {
                serde_json::from_str(raw).map_err(|e| RepositoryError::InvalidFilter(e.to_string()))
            },
        )
    }

    /// Refuse constraints on fields `T` keeps hidden.
    pub fn check<T: Record>(&self) -> Result<(), RepositoryError> {
        match self.0.keys().find(|key| T::HIDDEN_FIELDS.contains(&key.as_str())) {
            Some(key) => Err(RepositoryError::InvalidFilter(format!(
                "field '{key}' cannot be queried"
            ))),
            None => Ok(()),
        }
    }

    /// Whether a record, as a JSON object, satisfies every constraint.
    ///
    /// A missing field compares equal to `null`. Numbers compare by value, so
    /// `20` matches a stored `20.0`.
    #[must_use]
    pub fn matches(&self, record: &Map<String, Value>) -> bool {
        self.0.iter().all(|(field, expected)| {
            same_value(record.get(field).unwrap_or(&Value::Null), expected)
        })
    }
}

fn same_value(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a.total_cmp(&b).is_eq(),
            _ => a == b,
        },
        _ => actual == expected,
    }
}

/// Query for `find`: constraints plus pagination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Filter {
    #[serde(rename = "where", default)]
    pub conditions: Where,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub skip: Option<usize>,
}

impl Filter {
    /// Parse the `filter` query parameter. Absent means no constraints.
    pub fn parse(raw: Option<&str>) -> Result<Self, RepositoryError> {
        raw.map_or_else(
            || Ok(Self::default()),
            |raw| {
                serde_json::from_str(raw).map_err(|e| RepositoryError::InvalidFilter(e.to_string()))
            },
        )
    }
}

/// Partial update merged over a stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch(Map<String, Value>);

impl Patch {
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Merge this patch over `record`.
    ///
    /// Fails on protected fields, fields `T` does not have, and values of
    /// the wrong type.
    pub fn apply<T: Record>(&self, record: &T) -> Result<T, RepositoryError> {
        let mut object = to_object(record)?;
        for (field, value) in &self.0 {
            if T::PROTECTED_FIELDS.contains(&field.as_str()) {
                return Err(RepositoryError::InvalidPatch(format!(
                    "field '{field}' cannot be modified"
                )));
            }
            let Some(slot) = object.get_mut(field) else {
                return Err(RepositoryError::InvalidPatch(format!("unknown field '{field}'")));
            };
            *slot = value.clone();
        }
        serde_json::from_value(Value::Object(object))
            .map_err(|e| RepositoryError::InvalidPatch(e.to_string()))
    }
}

/// Serialize a record to a JSON object.
pub(crate) fn to_object<T: Serialize>(record: &T) -> Result<Map<String, Value>, RepositoryError> {
    match serde_json::to_value(record) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(RepositoryError::Serialization(
            "record is not a JSON object".to_string(),
        )),
        Err(e) => Err(RepositoryError::Serialization(e.to_string())),
    }
}

/// Storage for one resource's records.
pub trait Repository<T: Record>: Send + Sync {
    /// Store a new record under a fresh id.
    fn create(&self, record: T) -> Result<T, RepositoryError>;

    /// Count records matching `conditions`.
    fn count(&self, conditions: &Where) -> Result<usize, RepositoryError>;

    /// Records matching `filter`, in insertion order.
    fn find(&self, filter: &Filter) -> Result<Vec<T>, RepositoryError>;

    /// First record matching `conditions`, if any.
    fn find_one(&self, conditions: &Where) -> Result<Option<T>, RepositoryError>;

    /// Apply `patch` to every record matching `conditions`. Returns how many
    /// records changed. Either every match is updated or none is.
    fn update_all(&self, conditions: &Where, patch: &Patch) -> Result<usize, RepositoryError>;

    fn find_by_id(&self, id: &str) -> Result<T, RepositoryError>;

    fn update_by_id(&self, id: &str, patch: &Patch) -> Result<(), RepositoryError>;

    /// Replace a record wholesale. Protected fields keep their stored values.
    fn replace_by_id(&self, id: &str, record: T) -> Result<(), RepositoryError>;

    fn delete_by_id(&self, id: &str) -> Result<(), RepositoryError>;
}
