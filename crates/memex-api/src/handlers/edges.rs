//! Explicit edge handlers: user-drawn canvas connections.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use memex_core::{EdgeRepository, Error, NoteRepository};

use crate::error::ApiError;
use crate::handlers::notes::CreatedResponse;
use crate::owner::OwnerId;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateEdgeBody {
    pub source_id: Uuid,
    pub target_id: Uuid,
    pub label: Option<String>,
}

/// `POST /api/edges` — user-drawn connection between two of the
/// owner's notes. Self-loops are rejected; an already-linked pair is a
/// conflict rather than a duplicate row.
pub async fn create_edge(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(body): Json<CreateEdgeBody>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    if body.source_id == body.target_id {
        return Err(Error::InvalidInput("edge cannot point at its own source".to_string()).into());
    }

    // Both endpoints must be the owner's live notes.
    for id in [body.source_id, body.target_id] {
        state
            .db
            .notes
            .fetch(id, owner_id)
            .await?
            .ok_or_else(|| Error::NotFound("note".to_string()))?;
    }

    let created = state
        .db
        .edges
        .create(body.source_id, body.target_id, body.label.as_deref())
        .await?;

    match created {
        Some(id) => Ok((StatusCode::CREATED, Json(CreatedResponse { id }))),
        None => Err(Error::InvalidInput("edge already exists".to_string()).into()),
    }
}

/// `DELETE /api/edges/:id`
pub async fn delete_edge(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db.edges.delete(id, owner_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
