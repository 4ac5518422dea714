// Common DTOs for public API
//
// These types are shared across multiple API endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use eventdesk_core::RegistrationError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard error response for API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message describing what went wrong.
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Response wrapper for list endpoints.
/// All list endpoints return responses wrapped in a `data` field.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListResponse<T> {
    /// Array of items returned by the list operation.
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self { data }
    }
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(data: Vec<T>) -> Self {
        Self { data }
    }
}

/// Request body carrying a list of ids (bulk and archive endpoints).
///
/// Ids arrive as strings so that a malformed one is a 400 with a message,
/// not a body rejection.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IdsRequest {
    /// 1 to 50 UUIDs
    #[schema(example = json!(["01933b5a-0000-7000-8000-000000000001"]))]
    pub ids: Vec<String>,
}

/// Domain error rendered as `{"error": "..."}` with its HTTP status
#[derive(Debug)]
pub struct ApiError(pub RegistrationError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            RegistrationError::Validation(_) | RegistrationError::EventClosed(_) => {
                StatusCode::BAD_REQUEST
            }
            RegistrationError::Unauthorized => StatusCode::UNAUTHORIZED,
            RegistrationError::Forbidden(_) => StatusCode::FORBIDDEN,
            RegistrationError::NotFound(_) => StatusCode::NOT_FOUND,
            RegistrationError::Conflict(_) => StatusCode::CONFLICT,
            RegistrationError::CapacityExceeded { .. }
            | RegistrationError::Store(_)
            | RegistrationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(e: RegistrationError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, %status, "Request rejected");
        }
        (status, Json(ErrorResponse::new(self.0.to_string()))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
