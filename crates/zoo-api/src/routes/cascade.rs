//! Cascade endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use zoo_core::{CascadeReport, EntityKind};

use super::entities::DeleteQuery;
use crate::actor::ActingUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

fn kind(entity: &str) -> ApiResult<EntityKind> {
    entity
        .parse()
        .map_err(|_| ApiError::UnknownEntity(entity.to_string()))
}

/// What a cascade delete would touch
pub async fn preview_cascade(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
) -> ApiResult<Json<CascadeReport>> {
    let report = state
        .service
        .cascade()
        .preview_cascade_delete(kind(&entity)?, &id)
        .await?;
    Ok(Json(report))
}

/// Run a cascade delete
pub async fn run_cascade(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
    Query(query): Query<DeleteQuery>,
    ActingUser(actor): ActingUser,
) -> ApiResult<Json<CascadeReport>> {
    let report = state
        .service
        .cascade()
        .process_cascade_delete(kind(&entity)?, &id, query.cascade, Some(&actor.user_id))
        .await?;
    Ok(Json(report))
}
