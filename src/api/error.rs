use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use crate::error::GraphError;

/// JSON error body returned for every domain error.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Offending field for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for GraphError {
    fn into_response(self) -> Response {
        let (status, code, field) = match &self {
            GraphError::Validation { field, .. } => {
                (StatusCode::BAD_REQUEST, "validation_error", Some(field.clone()))
            }
            GraphError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found", None),
            GraphError::Conflict { .. } => (StatusCode::CONFLICT, "conflict", None),
            GraphError::InvalidOperation { .. } => {
                (StatusCode::CONFLICT, "invalid_operation", None)
            }
            GraphError::Internal { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = Json(ErrorBody {
            error: self.to_string(),
            code,
            field,
        });

        (status, body).into_response()
    }
}
