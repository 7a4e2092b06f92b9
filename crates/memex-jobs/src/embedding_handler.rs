//! Embedding refresh handlers.
//!
//! Each handler re-embeds one entity's current content and upserts the
//! vector, making the entity searchable by its new text. An entity that
//! vanished between enqueue and claim is a successful no-op — the
//! deletion already removed it from search.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use memex_core::{
    EmbeddingBackend, EmbeddingCollection, EmbeddingStore, Error, JobRepository, JobType,
};
use memex_db::Database;

use crate::handler::{JobContext, JobHandler, JobResult};

/// Recomputes a chat message's embedding.
pub struct EmbedMessageHandler {
    db: Database,
    embedder: Arc<dyn EmbeddingBackend>,
}

impl EmbedMessageHandler {
    pub fn new(db: Database, embedder: Arc<dyn EmbeddingBackend>) -> Self {
        Self { db, embedder }
    }
}

#[async_trait]
impl JobHandler for EmbedMessageHandler {
    fn job_type(&self) -> JobType {
        JobType::EmbedMessage
    }

    async fn execute(&self, ctx: JobContext) -> JobResult {
        let Some(message_id) = ctx.entity_id() else {
            return JobResult::Failed("embed_message job has no entity id".to_string());
        };

        let message = match self.db.conversations.get_message_unscoped(message_id).await {
            Ok(Some(message)) => message,
            Ok(None) => {
                debug!(message_id = %message_id, "Message vanished before embedding; skipping");
                return JobResult::Success(Some(json!({"skipped": "entity deleted"})));
            }
            Err(e) => return JobResult::Failed(e.to_string()),
        };

        embed_and_store(
            &self.db,
            self.embedder.as_ref(),
            EmbeddingCollection::Messages,
            message_id,
            &message.content,
            &ctx,
        )
        .await
    }
}

/// Recomputes a canvas note's embedding.
pub struct EmbedNoteHandler {
    db: Database,
    embedder: Arc<dyn EmbeddingBackend>,
}

impl EmbedNoteHandler {
    pub fn new(db: Database, embedder: Arc<dyn EmbeddingBackend>) -> Self {
        Self { db, embedder }
    }
}

#[async_trait]
impl JobHandler for EmbedNoteHandler {
    fn job_type(&self) -> JobType {
        JobType::EmbedNote
    }

    async fn execute(&self, ctx: JobContext) -> JobResult {
        let Some(note_id) = ctx.entity_id() else {
            return JobResult::Failed("embed_note job has no entity id".to_string());
        };

        let note = match self.db.notes.fetch_unscoped(note_id).await {
            Ok(Some(note)) => note,
            Ok(None) => {
                debug!(note_id = %note_id, "Note vanished before embedding; skipping");
                return JobResult::Success(Some(json!({"skipped": "entity deleted"})));
            }
            Err(e) => return JobResult::Failed(e.to_string()),
        };

        let result = embed_and_store(
            &self.db,
            self.embedder.as_ref(),
            EmbeddingCollection::Notes,
            note_id,
            &note.content,
            &ctx,
        )
        .await;

        // A fresh vector changes the note's neighborhood; chain the
        // auto-linking pass. Deduplicated, and its failure never fails
        // the embedding job itself.
        if matches!(result, JobResult::Success(_)) {
            let queued = self
                .db
                .jobs
                .queue_deduplicated(
                    Some(note_id),
                    JobType::LinkNote,
                    JobType::LinkNote.default_priority(),
                    None,
                )
                .await;
            if let Err(e) = queued {
                debug!(note_id = %note_id, error = %e, "Failed to queue auto-linking");
            }
        }

        result
    }
}

/// Shared tail of both handlers: embed the content, upsert the vector.
async fn embed_and_store(
    db: &Database,
    embedder: &dyn EmbeddingBackend,
    collection: EmbeddingCollection,
    entity_id: uuid::Uuid,
    content: &str,
    ctx: &JobContext,
) -> JobResult {
    let content = content.trim();
    if content.is_empty() {
        // Nothing to embed; drop any stale vector so the entity stops
        // matching its old text.
        return match db.embeddings.delete_embedding(collection, entity_id).await {
            Ok(()) => JobResult::Success(Some(json!({"skipped": "empty content"}))),
            Err(e) => JobResult::Failed(e.to_string()),
        };
    }

    ctx.report_progress(25, Some("Embedding content"));

    let vectors = match embedder.embed_texts(&[content.to_string()]).await {
        Ok(vectors) => vectors,
        // Provider failures are transient by assumption; the queue
        // retries until max_retries.
        Err(e @ Error::Embedding(_)) => return JobResult::Retry(e.to_string()),
        Err(e) => return JobResult::Failed(e.to_string()),
    };

    let Some(vector) = vectors.into_iter().next() else {
        return JobResult::Failed("provider returned no vector".to_string());
    };

    ctx.report_progress(75, Some("Storing vector"));

    match db
        .embeddings
        .set_embedding(collection, entity_id, &vector, embedder.model_name())
        .await
    {
        Ok(()) => JobResult::Success(Some(json!({"model": embedder.model_name()}))),
        Err(e) => JobResult::Failed(e.to_string()),
    }
}
