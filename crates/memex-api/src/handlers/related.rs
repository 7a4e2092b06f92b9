//! Relatedness query handler.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use memex_core::{defaults, RelatedEntities};

use crate::error::ApiError;
use crate::owner::OwnerId;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RelatedRequest {
    pub query: String,
    pub limit: Option<i64>,
}

/// `POST /api/related` — ranked related messages and notes for a
/// free-text query, owner-scoped.
pub async fn find_related(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(req): Json<RelatedRequest>,
) -> Result<Json<RelatedEntities>, ApiError> {
    let limit = req.limit.unwrap_or(defaults::RELATED_LIMIT);
    let related = state.engine.find_related(&req.query, owner_id, limit).await?;
    Ok(Json(related))
}
