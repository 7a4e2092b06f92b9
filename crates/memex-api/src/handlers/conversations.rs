//! Conversation and message handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use memex_core::{ConversationRepository, JobRepository, JobType, Message, Role};

use crate::error::ApiError;
use crate::handlers::notes::CreatedResponse;
use crate::owner::OwnerId;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateConversationBody {
    pub title: Option<String>,
}

/// `POST /api/conversations`
pub async fn create_conversation(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(body): Json<CreateConversationBody>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let id = state
        .db
        .conversations
        .create(owner_id, body.title.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[derive(Deserialize)]
pub struct AppendMessageBody {
    pub role: Role,
    pub content: String,
}

/// `POST /api/conversations/:id/messages` — append and queue the
/// message's embedding in the background.
pub async fn append_message(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(conversation_id): Path<Uuid>,
    Json(body): Json<AppendMessageBody>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let id = state
        .db
        .conversations
        .append_message(conversation_id, owner_id, body.role, &body.content)
        .await?;

    let queued = state
        .db
        .jobs
        .queue_deduplicated(
            Some(id),
            JobType::EmbedMessage,
            JobType::EmbedMessage.default_priority(),
            None,
        )
        .await;
    if let Err(e) = queued {
        tracing::error!(
            subsystem = "api",
            message_id = %id,
            error = %e,
            "Failed to queue message embedding"
        );
    }

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// `GET /api/conversations/:id/messages`
pub async fn list_messages(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = state
        .db
        .conversations
        .list_messages(conversation_id, owner_id)
        .await?;
    Ok(Json(messages))
}
