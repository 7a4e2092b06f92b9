//! Canvas note handlers: CRUD, linking, backlinks.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use memex_core::{
    CreateNoteRequest, DirectBacklink, Error, JobRepository, JobType, Note, NoteRepository,
    NoteSource,
};

use crate::error::ApiError;
use crate::owner::OwnerId;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateNoteBody {
    pub content: String,
    pub title: Option<String>,
    #[serde(default)]
    pub position_x: f64,
    #[serde(default)]
    pub position_y: f64,
    pub width: Option<f64>,
    pub height: Option<f64>,
    #[serde(default)]
    pub source: NoteSource,
    pub source_ref: Option<String>,
    pub parent_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}

/// Queue the embedding refresh for a note, deduplicated. Enqueue
/// failures are logged, never surfaced to the edit that triggered them.
async fn queue_note_embedding(state: &AppState, note_id: Uuid) {
    let result = state
        .db
        .jobs
        .queue_deduplicated(
            Some(note_id),
            JobType::EmbedNote,
            JobType::EmbedNote.default_priority(),
            None,
        )
        .await;
    if let Err(e) = result {
        tracing::error!(
            subsystem = "api",
            note_id = %note_id,
            error = %e,
            "Failed to queue embedding refresh"
        );
    }
}

/// `POST /api/notes`
pub async fn create_note(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(body): Json<CreateNoteBody>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let req = CreateNoteRequest {
        owner_id,
        title: body.title,
        content: body.content,
        position_x: body.position_x,
        position_y: body.position_y,
        width: body.width.unwrap_or(memex_core::defaults::NOTE_WIDTH),
        height: body.height.unwrap_or(memex_core::defaults::NOTE_HEIGHT),
        source: body.source,
        source_ref: body.source_ref,
        parent_id: body.parent_id,
    };

    let id = state.db.notes.insert(req).await?;
    queue_note_embedding(&state, id).await;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// `GET /api/notes/:id`
pub async fn get_note(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> Result<Json<Note>, ApiError> {
    let note = state
        .db
        .notes
        .fetch(id, owner_id)
        .await?
        .ok_or_else(|| Error::NotFound("note".to_string()))?;
    Ok(Json(note))
}

#[derive(Deserialize)]
pub struct UpdateNoteBody {
    pub content: Option<String>,
    pub title: Option<String>,
}

/// `PATCH /api/notes/:id` — content/title updates. A content change
/// returns immediately; the embedding refresh happens in the
/// background, so the note is briefly searchable by its old text.
pub async fn update_note(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateNoteBody>,
) -> Result<StatusCode, ApiError> {
    if body.content.is_none() && body.title.is_none() {
        return Err(Error::InvalidInput("nothing to update".to_string()).into());
    }

    if let Some(title) = &body.title {
        state.db.notes.update_title(id, owner_id, title).await?;
    }

    if let Some(content) = &body.content {
        state.db.notes.update_content(id, owner_id, content).await?;
        queue_note_embedding(&state, id).await;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/notes/:id` — cascades edges and the vector.
pub async fn delete_note(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db.delete_note(id, owner_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/notes/:id/links` — run a relatedness query over the
/// note's content and persist edges to the related notes.
pub async fn link_note(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let note = state
        .db
        .notes
        .fetch(id, owner_id)
        .await?
        .ok_or_else(|| Error::NotFound("note".to_string()))?;

    let related = state
        .engine
        .find_related(&note.content, owner_id, memex_core::defaults::RELATED_LIMIT)
        .await?;

    let created = state.materializer.materialize(id, &related).await?;

    Ok(Json(json!({
        "created": created,
        "related": related,
    })))
}

/// `GET /api/notes/:id/backlinks` — edge-based backlinks.
pub async fn direct_backlinks(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DirectBacklink>>, ApiError> {
    let backlinks = state.backlinks.direct_backlinks(id, owner_id).await?;
    Ok(Json(backlinks))
}

#[derive(Deserialize)]
pub struct WikiBacklinksQuery {
    pub title: String,
}

/// `GET /api/backlinks?title=` — wiki-link text-scan backlinks.
pub async fn wiki_backlinks(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Query(query): Query<WikiBacklinksQuery>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = state.backlinks.wiki_backlinks(owner_id, &query.title).await?;
    Ok(Json(notes))
}
