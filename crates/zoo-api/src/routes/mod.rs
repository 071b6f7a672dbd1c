//! API route handlers

pub mod cascade;
pub mod entities;
pub mod health;
pub mod sandbox;

use axum::{
    routing::{get, post},
    Router,
};
use serde_json::Value;
use zoo_store::Record;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Entity CRUD
        .route(
            "/v1/entities/:entity",
            get(entities::list_entities).post(entities::create_entity),
        )
        .route(
            "/v1/entities/:entity/:id",
            get(entities::get_entity)
                .put(entities::update_entity)
                .delete(entities::delete_entity),
        )
        // Cascade
        .route(
            "/v1/cascade/:entity/:id",
            get(cascade::preview_cascade).post(cascade::run_cascade),
        )
        // Sandbox assistants
        .route(
            "/v1/sandbox",
            get(sandbox::list_sandboxes).post(sandbox::create_sandbox),
        )
        .route("/v1/sandbox/cleanup", post(sandbox::cleanup_sandboxes))
        .route(
            "/v1/sandbox/:id",
            get(sandbox::get_sandbox)
                .patch(sandbox::update_sandbox)
                .delete(sandbox::delete_sandbox),
        )
        .route("/v1/sandbox/:id/promote", post(sandbox::promote_sandbox))
        .with_state(state)
}

/// Request body as a record
fn into_record(body: Value) -> ApiResult<Record> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::NotAnObject),
    }
}
