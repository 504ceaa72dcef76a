// src/utils/api_response.rs
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::workflow::WorkflowError;

/// Uniform JSON envelope for every API response.
#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<serde_json::Value>,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            success: true,
            status_code: status.as_u16(),
            message: message.into(),
            timestamp: Utc::now().to_rfc3339(),
            data: Some(data),
            errors: None,
        }
    }

    pub fn error(
        status: StatusCode,
        message: impl Into<String>,
        errors: Option<serde_json::Value>,
    ) -> Self {
        ApiResponse {
            success: false,
            status_code: status.as_u16(),
            message: message.into(),
            timestamp: Utc::now().to_rfc3339(),
            data: None,
            errors,
        }
    }
}

/// Maps the workflow error taxonomy onto HTTP statuses, so handlers can use
/// `?` directly on orchestrator calls.
impl From<WorkflowError> for ApiResponse<()> {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::NotFound => {
                ApiResponse::error(StatusCode::NOT_FOUND, "Request not found", None)
            }
            WorkflowError::Forbidden(msg) => ApiResponse::error(StatusCode::FORBIDDEN, msg, None),
            WorkflowError::Conflict(msg) => ApiResponse::error(StatusCode::CONFLICT, msg, None),
            WorkflowError::Validation(msg) => {
                ApiResponse::error(StatusCode::BAD_REQUEST, msg, None)
            }
            WorkflowError::Store(e) => {
                tracing::error!(error = %e, "storage failure");
                ApiResponse::error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage failure",
                    Some(json!({ "error": e.to_string() })),
                )
            }
        }
    }
}
