//! Maps `scout_core::Error` onto HTTP status codes and JSON error bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::types::ErrorResponse;

pub struct ApiError(pub scout_core::Error);

impl From<scout_core::Error> for ApiError {
    fn from(err: scout_core::Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            scout_core::Error::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            scout_core::Error::Conflict(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            scout_core::Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            scout_core::Error::InvalidSearch(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            scout_core::Error::Engine(msg) => {
                tracing::error!(error = %msg, "engine failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
