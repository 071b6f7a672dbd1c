//! API error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use zoo_core::AdminError;

/// API error types
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Domain rejection, carries its own status
    #[error(transparent)]
    Admin(#[from] AdminError),

    /// Path names an unknown entity type
    #[error("unknown entity type: {0}")]
    UnknownEntity(String),

    /// Request body is not a JSON object
    #[error("request body must be a JSON object")]
    NotAnObject,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (body, status) = match self {
            Self::Admin(err) => err.into_parts(),
            Self::UnknownEntity(_) => (json!({"message": message, "code": "NOT_FOUND"}), 404),
            Self::NotAnObject => (json!({"message": message, "code": "VALIDATION_ERROR"}), 400),
        };
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), body = %body, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), body = %body, "request rejected");
        }

        (status, Json(body)).into_response()
    }
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use zoo_core::EntityKind;

    #[test]
    fn admin_status_passes_through() {
        let response = ApiError::from(AdminError::not_found(EntityKind::User, "u1")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError::from(AdminError::Gone {
            entity: "sandbox".into(),
            id: "s1".into(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::GONE);
    }

    #[test]
    fn unknown_entity_is_404() {
        let response = ApiError::UnknownEntity("zebras".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
