//! Health check endpoint

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

/// Health response body
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `healthy` when the process answers
    pub status: &'static str,
    /// Crate version
    pub version: String,
    /// Registered entity handlers
    pub entities: Vec<&'static str>,
}

/// Liveness probe
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: state.version.clone(),
        entities: state
            .service
            .handlers()
            .kinds()
            .into_iter()
            .map(|k| k.collection())
            .collect(),
    })
}
