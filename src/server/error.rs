//! Caller-visible request errors
//!
//! Every variant maps to `400 Bad Request` with an `{"error": "..."}` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Path parameter is not a valid integer for the endpoint
    #[error("Invalid delay value")]
    InvalidDelay,

    /// Request body is not a valid config document
    #[error("Invalid JSON")]
    InvalidJson,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
