//! Identifiers for the operations a strategy can guard.

use std::fmt;

/// A resource exposed over the CRUD surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Person accounts.
    Persons,
    /// Catalog products.
    Products,
}

impl Resource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Persons => "persons",
            Self::Products => "products",
        }
    }
}

/// An operation on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Count,
    Find,
    UpdateAll,
    FindById,
    UpdateById,
    ReplaceById,
    DeleteById,
}

impl Operation {
    /// Every operation, in route declaration order.
    pub const ALL: [Self; 8] = [
        Self::Create,
        Self::Count,
        Self::Find,
        Self::UpdateAll,
        Self::FindById,
        Self::UpdateById,
        Self::ReplaceById,
        Self::DeleteById,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Count => "count",
            Self::Find => "find",
            Self::UpdateAll => "update_all",
            Self::FindById => "find_by_id",
            Self::UpdateById => "update_by_id",
            Self::ReplaceById => "replace_by_id",
            Self::DeleteById => "delete_by_id",
        }
    }
}

/// A specific operation on a specific resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationId {
    pub resource: Resource,
    pub operation: Operation,
}

impl OperationId {
    #[must_use]
    pub const fn new(resource: Resource, operation: Operation) -> Self {
        Self {
            resource,
            operation,
        }
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource.as_str(), self.operation.as_str())
    }
}
