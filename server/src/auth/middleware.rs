//! Request interceptor that runs the registry before an operation.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::operation::OperationId;
use super::registry::{Admission, StrategyRegistry};

/// Middleware state: the registry and the operation the wrapped route runs.
#[derive(Clone)]
pub struct Guard {
    registry: Arc<StrategyRegistry>,
    operation: OperationId,
}

impl Guard {
    #[must_use]
    pub const fn new(registry: Arc<StrategyRegistry>, operation: OperationId) -> Self {
        Self {
            registry,
            operation,
        }
    }
}

/// Admit or reject a request before its handler runs.
///
/// On admission with a principal, the principal is stored in the request
/// extensions. On rejection the handler never runs.
pub async fn authenticate(
    State(guard): State<Guard>,
    mut request: Request,
    next: Next,
) -> Response {
    match guard.registry.admit(guard.operation, request.headers()) {
        Ok(Admission::Open) => next.run(request).await,
        Ok(Admission::Authenticated(principal)) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(rejection) => rejection.into_response(),
    }
}
