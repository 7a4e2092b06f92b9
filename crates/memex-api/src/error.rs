//! API error mapping: core errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use memex_core::Error;

/// Wrapper turning core errors into HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            // "Doesn't exist" and "not yours" are indistinguishable by
            // design; both are a plain 404.
            Error::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            Error::Embedding(_) | Error::Request(_) => (
                StatusCode::BAD_GATEWAY,
                "upstream provider failed".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(subsystem = "api", error = %self.0, "Request failed");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
