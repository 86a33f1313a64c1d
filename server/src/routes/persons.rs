//! Person registration.
//!
//! Every other person operation is served by the shared CRUD handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::accounts::AccountService;
use crate::error::ApiError;
use crate::models::{NewPerson, PersonView};

/// Create a person and deliver their generated credential.
///
/// Hashing runs on the blocking pool.
pub async fn create(
    State(accounts): State<Arc<AccountService>>,
    Json(body): Json<NewPerson>,
) -> Result<Json<PersonView>, ApiError> {
    let person = tokio::task::spawn_blocking(move || accounts.create_account(body)).await??;
    Ok(Json(person.into()))
}
