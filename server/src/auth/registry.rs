//! Strategy registry and dispatch.
//!
//! Binds named strategies to the operations they guard. A resource can be
//! guarded as a whole (blanket), single operations can be guarded on their
//! own, and single operations can be exempted from a blanket guard.
//!
//! # Pre-conditions
//! - Every strategy named by a guard is registered before `build()`.
//!
//! # Post-conditions
//! - A built registry is immutable and shared read-only across requests.
//!
//! # Invariants
//! - An exempt operation never invokes a strategy.
//! - A guarded operation is only admitted with a `Principal`.

use std::collections::{HashMap, HashSet};

use super::operation::{Operation, OperationId, Resource};
use super::principal::Principal;
use super::rejection::{AuthRejection, InvalidReason};
use super::strategy::{BearerSource, Strategy, StrategyName};

/// Error returned when a registry is misconfigured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A guard names a strategy that was never registered.
    UnknownStrategy {
        strategy: StrategyName,
        resource: Resource,
    },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownStrategy { strategy, resource } => write!(
                f,
                "resource '{}' is guarded by unregistered strategy '{strategy}'",
                resource.as_str()
            ),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Outcome of a successful admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The operation is not guarded; no strategy ran.
    Open,
    /// A strategy admitted the caller.
    Authenticated(Principal),
}

#[derive(Debug, Default)]
struct ResourceGuard {
    blanket: Option<StrategyName>,
    operations: HashMap<Operation, StrategyName>,
    exempt: HashSet<Operation>,
}

impl ResourceGuard {
    fn strategy_for(&self, operation: Operation) -> Option<StrategyName> {
        if self.exempt.contains(&operation) {
            return None;
        }
        self.operations.get(&operation).copied().or(self.blanket)
    }

    fn named_strategies(&self) -> impl Iterator<Item = StrategyName> + '_ {
        self.blanket.into_iter().chain(self.operations.values().copied())
    }
}

/// Builds a [`StrategyRegistry`] at startup.
#[derive(Default)]
pub struct StrategyRegistryBuilder {
    strategies: HashMap<StrategyName, Strategy>,
    guards: HashMap<Resource, ResourceGuard>,
}

impl StrategyRegistryBuilder {
    /// Register a strategy under its name, replacing any previous one.
    #[must_use]
    pub fn register(mut self, strategy: Strategy) -> Self {
        self.strategies.insert(strategy.name(), strategy);
        self
    }

    /// Require `strategy` for every operation on `resource`.
    #[must_use]
    pub fn protect_resource(mut self, resource: Resource, strategy: StrategyName) -> Self {
        self.guards.entry(resource).or_default().blanket = Some(strategy);
        self
    }

    /// Require `strategy` for one operation.
    #[must_use]
    pub fn protect_operation(mut self, id: OperationId, strategy: StrategyName) -> Self {
        self.guards
            .entry(id.resource)
            .or_default()
            .operations
            .insert(id.operation, strategy);
        self
    }

    /// Exempt one operation from any guard on its resource.
    #[must_use]
    pub fn exempt(mut self, id: OperationId) -> Self {
        self.guards
            .entry(id.resource)
            .or_default()
            .exempt
            .insert(id.operation);
        self
    }

    /// Finish building.
    ///
    /// # Errors
    /// Returns `RegistryError::UnknownStrategy` if a guard names a strategy
    /// that was not registered.
    pub fn build(self) -> Result<StrategyRegistry, RegistryError> {
        for (resource, guard) in &self.guards {
            if let Some(strategy) = guard
                .named_strategies()
                .find(|name| !self.strategies.contains_key(name))
            {
                return Err(RegistryError::UnknownStrategy {
                    strategy,
                    resource: *resource,
                });
            }
        }

        Ok(StrategyRegistry {
            strategies: self.strategies,
            guards: self.guards,
        })
    }
}

/// Immutable association of strategies with guarded operations.
pub struct StrategyRegistry {
    strategies: HashMap<StrategyName, Strategy>,
    guards: HashMap<Resource, ResourceGuard>,
}

impl StrategyRegistry {
    #[must_use]
    pub fn builder() -> StrategyRegistryBuilder {
        StrategyRegistryBuilder::default()
    }

    /// The strategy that must admit `id`, if any.
    #[must_use]
    pub fn required_strategy(&self, id: OperationId) -> Option<StrategyName> {
        self.guards
            .get(&id.resource)
            .and_then(|guard| guard.strategy_for(id.operation))
    }

    /// Decide whether a request may run `id`.
    ///
    /// Unguarded and exempt operations are admitted without running any
    /// strategy.
    pub fn admit<R: BearerSource + ?Sized>(
        &self,
        id: OperationId,
        request: &R,
    ) -> Result<Admission, AuthRejection> {
        let Some(name) = self.required_strategy(id) else {
            return Ok(Admission::Open);
        };

        let Some(strategy) = self.strategies.get(&name) else {
            tracing::error!(
                operation = %id,
                strategy = %name,
                "guard names an unregistered strategy"
            );
            return Err(AuthRejection::CredentialInvalid(InvalidReason::StrategyUnavailable));
        };

        let principal = strategy.authenticate(request)?;
        tracing::debug!(
            operation = %id,
            strategy = %name,
            subject = %principal.subject,
            "request admitted"
        );
        Ok(Admission::Authenticated(principal))
    }
}
