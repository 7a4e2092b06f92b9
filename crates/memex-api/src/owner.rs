//! Request owner extraction.
//!
//! Identity-provider mechanics live outside this service: the reverse
//! proxy authenticates the user and forwards their id in the
//! `x-memex-owner` header. Every handler takes the owner from here and
//! passes it down, so no read escapes the ownership scope.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use uuid::Uuid;

/// Header carrying the authenticated owner id.
pub const OWNER_HEADER: &str = "x-memex-owner";

/// Extractor for the authenticated owner's id.
#[derive(Debug, Clone, Copy)]
pub struct OwnerId(pub Uuid);

#[async_trait::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for OwnerId {
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .map(OwnerId)
            .ok_or((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "missing or invalid owner header" })),
            ))
    }
}
