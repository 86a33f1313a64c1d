//! HTTP surface.
//!
//! Every resource route is wrapped in the guard middleware with the
//! `OperationId` it serves. The registry decides per request whether a
//! strategy must admit it.

pub mod crud;
pub mod persons;
pub mod session;

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{FromRef, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{MethodRouter, delete, get, patch, post, put};
use axum::Router;

use crate::accounts::AccountService;
use crate::auth::{
    AdminStrategy, Guard, Operation, OperationId, RegistryError, Resource, Strategy,
    StrategyName, StrategyRegistry, TokenService, authenticate,
};
use crate::models::{Person, Product};
use crate::repository::Repository;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub persons: Arc<dyn Repository<Person>>,
    pub products: Arc<dyn Repository<Product>>,
    pub accounts: Arc<AccountService>,
}

impl FromRef<AppState> for Arc<dyn Repository<Person>> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.persons)
    }
}

impl FromRef<AppState> for Arc<dyn Repository<Product>> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.products)
    }
}

impl FromRef<AppState> for Arc<AccountService> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.accounts)
    }
}

/// Startup guard configuration.
///
/// Products require `admin` except for `count`; deleting a person requires
/// `admin`; everything else is open.
pub fn default_registry(tokens: Arc<TokenService>) -> Result<StrategyRegistry, RegistryError> {
    StrategyRegistry::builder()
        .register(Strategy::Admin(AdminStrategy::new(tokens)))
        .protect_resource(Resource::Products, StrategyName::Admin)
        .exempt(OperationId::new(Resource::Products, Operation::Count))
        .protect_operation(
            OperationId::new(Resource::Persons, Operation::DeleteById),
            StrategyName::Admin,
        )
        .build()
}

/// Wrap `route` in the guard for one operation.
fn guarded(
    registry: &Arc<StrategyRegistry>,
    resource: Resource,
    operation: Operation,
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    let guard = Guard::new(Arc::clone(registry), OperationId::new(resource, operation));
    route.route_layer(middleware::from_fn_with_state(guard, authenticate))
}

/// Build the application router.
#[must_use]
pub fn router(state: AppState, registry: &Arc<StrategyRegistry>) -> Router {
    let person = |op, route| guarded(registry, Resource::Persons, op, route);
    let product = |op, route| guarded(registry, Resource::Products, op, route);

    Router::new()
        .route("/persons", person(Operation::Create, post(persons::create)))
        .route("/persons/count", person(Operation::Count, get(crud::count::<Person>)))
        .route("/persons", person(Operation::Find, get(crud::find::<Person>)))
        .route("/persons", person(Operation::UpdateAll, patch(crud::update_all::<Person>)))
        .route("/persons/{id}", person(Operation::FindById, get(crud::find_by_id::<Person>)))
        .route(
            "/persons/{id}",
            person(Operation::UpdateById, patch(crud::update_by_id::<Person>)),
        )
        .route(
            "/persons/{id}",
            person(Operation::ReplaceById, put(crud::replace_by_id::<Person>)),
        )
        .route(
            "/persons/{id}",
            person(Operation::DeleteById, delete(crud::delete_by_id::<Person>)),
        )
        .route("/products", product(Operation::Create, post(crud::create::<Product>)))
        .route("/products/count", product(Operation::Count, get(crud::count::<Product>)))
        .route("/products", product(Operation::Find, get(crud::find::<Product>)))
        .route(
            "/products",
            product(Operation::UpdateAll, patch(crud::update_all::<Product>)),
        )
        .route(
            "/products/{id}",
            product(Operation::FindById, get(crud::find_by_id::<Product>)),
        )
        .route(
            "/products/{id}",
            product(Operation::UpdateById, patch(crud::update_by_id::<Product>)),
        )
        .route(
            "/products/{id}",
            product(Operation::ReplaceById, put(crud::replace_by_id::<Product>)),
        )
        .route(
            "/products/{id}",
            product(Operation::DeleteById, delete(crud::delete_by_id::<Product>)),
        )
        .route("/login", post(session::login))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// Log method, path, status and latency of every request.
///
/// The query string is left out; it may carry filter values.
async fn log_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "request completed"
    );
    response
}
