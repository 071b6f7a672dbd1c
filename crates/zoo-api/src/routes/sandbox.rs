//! Sandbox assistant endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use zoo_core::Promotion;
use zoo_store::Record;

use super::into_record;
use crate::actor::ActingUser;
use crate::error::ApiResult;
use crate::state::AppState;

/// `?createdBy=`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxListQuery {
    /// Only sandboxes created by this user
    pub created_by: Option<String>,
}

/// Cleanup response body
#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    /// Expired rows removed
    pub removed: usize,
}

/// List live sandboxes
pub async fn list_sandboxes(
    State(state): State<AppState>,
    Query(query): Query<SandboxListQuery>,
) -> ApiResult<Json<Vec<Record>>> {
    let rows = state
        .service
        .sandboxes()
        .list_sandbox_assistants(query.created_by.as_deref())
        .await?;
    Ok(Json(rows))
}

/// Create a draft sandbox
pub async fn create_sandbox(
    State(state): State<AppState>,
    ActingUser(actor): ActingUser,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<Record>)> {
    let created = state
        .service
        .sandboxes()
        .create_sandbox_assistant(into_record(body)?, &actor)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Fetch a live sandbox
pub async fn get_sandbox(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Record>> {
    Ok(Json(state.service.sandboxes().get_sandbox_assistant(&id).await?))
}

/// Edit overrides or status
pub async fn update_sandbox(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ActingUser(actor): ActingUser,
    Json(body): Json<Value>,
) -> ApiResult<Json<Record>> {
    let updated = state
        .service
        .sandboxes()
        .update_sandbox_assistant(&id, into_record(body)?, &actor)
        .await?;
    Ok(Json(updated))
}

/// Remove a sandbox
pub async fn delete_sandbox(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.service.sandboxes().delete_sandbox_assistant(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Apply a sandbox to its live assistant
pub async fn promote_sandbox(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ActingUser(actor): ActingUser,
) -> ApiResult<Json<Promotion>> {
    Ok(Json(
        state
            .service
            .sandboxes()
            .promote_sandbox_to_live(&id, &actor)
            .await?,
    ))
}

/// Remove every expired sandbox
pub async fn cleanup_sandboxes(State(state): State<AppState>) -> ApiResult<Json<CleanupResponse>> {
    let removed = state.service.sandboxes().cleanup_expired_sandboxes().await?;
    Ok(Json(CleanupResponse { removed }))
}
