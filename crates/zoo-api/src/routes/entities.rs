//! Entity CRUD endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use zoo_core::{CascadeReport, EntityHandler};
use zoo_store::Record;

use super::into_record;
use crate::actor::ActingUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `?includeDeleted=`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// Include soft-deleted rows
    #[serde(default)]
    pub include_deleted: bool,
}

/// `?cascade=`
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    /// Propagate to dependents (default true)
    #[serde(default = "default_true")]
    pub cascade: bool,
}

fn default_true() -> bool {
    true
}

fn handler(state: &AppState, entity: &str) -> ApiResult<Arc<dyn EntityHandler>> {
    state
        .service
        .handlers()
        .resolve(entity)
        .ok_or_else(|| ApiError::UnknownEntity(entity.to_string()))
}

/// List records of a type
pub async fn list_entities(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Record>>> {
    let records = handler(&state, &entity)?.list(query.include_deleted).await?;
    Ok(Json(records))
}

/// Create a record
pub async fn create_entity(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    ActingUser(actor): ActingUser,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Record>)> {
    let created = handler(&state, &entity)?.create(into_record(body)?, &actor).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Fetch one record
pub async fn get_entity(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
) -> ApiResult<Json<Record>> {
    Ok(Json(handler(&state, &entity)?.get(&id).await?))
}

/// Merge fields into a record
pub async fn update_entity(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
    ActingUser(actor): ActingUser,
    Json(body): Json<Value>,
) -> ApiResult<Json<Record>> {
    let updated = handler(&state, &entity)?
        .update(&id, into_record(body)?, &actor)
        .await?;
    Ok(Json(updated))
}

/// Soft-delete a record
pub async fn delete_entity(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
    Query(query): Query<DeleteQuery>,
    ActingUser(actor): ActingUser,
) -> ApiResult<Json<CascadeReport>> {
    let report = handler(&state, &entity)?
        .delete(&id, &actor, query.cascade)
        .await?;
    Ok(Json(report))
}
