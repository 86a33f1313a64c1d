//! Handlers for the CRUD operations shared by every resource.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::auth::Principal;
use crate::error::ApiError;
use crate::repository::{Filter, Patch, Record, Repository, Where};

/// Query string carrying a JSON `where` object.
#[derive(Debug, Default, Deserialize)]
pub struct WhereQuery {
    #[serde(rename = "where")]
    conditions: Option<String>,
}

/// Query string carrying a JSON `filter` object.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    filter: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CountBody {
    pub count: usize,
}

pub async fn create<T: Record>(
    State(repository): State<Arc<dyn Repository<T>>>,
    Json(body): Json<T::New>,
) -> Result<Json<T::View>, ApiError> {
    let record = repository.create(T::from_new(body))?;
    Ok(Json(record.into()))
}

pub async fn count<T: Record>(
    State(repository): State<Arc<dyn Repository<T>>>,
    Query(query): Query<WhereQuery>,
) -> Result<Json<CountBody>, ApiError> {
    let conditions = Where::parse(query.conditions.as_deref())?;
    let count = repository.count(&conditions)?;
    Ok(Json(CountBody { count }))
}

pub async fn find<T: Record>(
    State(repository): State<Arc<dyn Repository<T>>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<T::View>>, ApiError> {
    let filter = Filter::parse(query.filter.as_deref())?;
    let records = repository.find(&filter)?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

pub async fn update_all<T: Record>(
    State(repository): State<Arc<dyn Repository<T>>>,
    Query(query): Query<WhereQuery>,
    Json(patch): Json<Patch>,
) -> Result<Json<CountBody>, ApiError> {
    let conditions = Where::parse(query.conditions.as_deref())?;
    let count = repository.update_all(&conditions, &patch)?;
    Ok(Json(CountBody { count }))
}

pub async fn find_by_id<T: Record>(
    State(repository): State<Arc<dyn Repository<T>>>,
    Path(id): Path<String>,
) -> Result<Json<T::View>, ApiError> {
    Ok(Json(repository.find_by_id(&id)?.into()))
}

pub async fn update_by_id<T: Record>(
    State(repository): State<Arc<dyn Repository<T>>>,
    Path(id): Path<String>,
    Json(patch): Json<Patch>,
) -> Result<StatusCode, ApiError> {
    repository.update_by_id(&id, &patch)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn replace_by_id<T: Record>(
    State(repository): State<Arc<dyn Repository<T>>>,
    Path(id): Path<String>,
    Json(body): Json<T::New>,
) -> Result<StatusCode, ApiError> {
    repository.replace_by_id(&id, T::from_new(body))?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_by_id<T: Record>(
    State(repository): State<Arc<dyn Repository<T>>>,
    Path(id): Path<String>,
    principal: Option<Principal>,
) -> Result<StatusCode, ApiError> {
    repository.delete_by_id(&id)?;
    if let Some(principal) = principal {
        tracing::info!(
            resource = T::RESOURCE.as_str(),
            %id,
            actor = %principal.subject,
            "record deleted"
        );
    }
    Ok(StatusCode::NO_CONTENT)
}
