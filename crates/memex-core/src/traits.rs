//! Core traits for memex abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability. The
//! Postgres implementations live in `memex-db`; in-memory fakes back
//! the engine tests in `memex-search`.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// CONVERSATION / MESSAGE REPOSITORY
// =============================================================================

/// Repository for conversations and their messages.
///
/// Every read takes the requesting owner and returns `None` both for
/// "does not exist" and "not yours".
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Create a new conversation for an owner.
    async fn create(&self, owner_id: Uuid, title: Option<&str>) -> Result<Uuid>;

    /// Fetch a conversation, owner-checked.
    async fn get(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Conversation>>;

    /// Append a message to a conversation the owner holds.
    ///
    /// Fails with `NotFound` when the conversation is absent or owned
    /// by someone else.
    async fn append_message(
        &self,
        conversation_id: Uuid,
        owner_id: Uuid,
        role: Role,
        content: &str,
    ) -> Result<Uuid>;

    /// List a conversation's messages in creation order, owner-checked.
    async fn list_messages(&self, conversation_id: Uuid, owner_id: Uuid) -> Result<Vec<Message>>;
}

// =============================================================================
// NOTE REPOSITORY
// =============================================================================

/// Repository for canvas note CRUD and title lookups.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a new note.
    async fn insert(&self, req: CreateNoteRequest) -> Result<Uuid>;

    /// Fetch a note, owner-checked.
    async fn fetch(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Note>>;

    /// Replace a note's content. The caller is responsible for queueing
    /// the embedding refresh afterwards.
    async fn update_content(&self, id: Uuid, owner_id: Uuid, content: &str) -> Result<()>;

    /// Update a note's title.
    async fn update_title(&self, id: Uuid, owner_id: Uuid, title: &str) -> Result<()>;

    /// Move/resize a note on the canvas.
    async fn update_geometry(
        &self,
        id: Uuid,
        owner_id: Uuid,
        position_x: f64,
        position_y: f64,
        width: f64,
        height: f64,
    ) -> Result<()>;

    /// Soft-delete a note. Edge and embedding cleanup is the caller's
    /// responsibility (see `Database::delete_note` in memex-db).
    async fn soft_delete(&self, id: Uuid, owner_id: Uuid) -> Result<()>;

    /// Exact case-insensitive title lookup (leading/trailing whitespace
    /// ignored).
    async fn find_by_title(&self, owner_id: Uuid, title: &str) -> Result<Option<Note>>;

    /// Case-insensitive substring match over the owner's titles, in
    /// creation order, capped at `limit`.
    async fn suggest_titles(
        &self,
        owner_id: Uuid,
        fragment: &str,
        limit: i64,
    ) -> Result<Vec<TitleSuggestion>>;

    /// Coarse prefilter for wiki backlinks: the owner's notes whose
    /// content contains `[[` followed (anywhere) by the given title,
    /// case-insensitively. Callers confirm with an exact scan.
    async fn scan_wiki_candidates(&self, owner_id: Uuid, title: &str) -> Result<Vec<Note>>;
}

// =============================================================================
// OWNER-CHECKED ENTITY STORE
// =============================================================================

/// Authorization-checked entity resolution used when vector hits are
/// turned into full entities. A hit whose owner check fails resolves to
/// `None` and is silently dropped from results.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Resolve a message by id, visible only to the owner of its
    /// conversation.
    async fn get_message(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Message>>;

    /// Resolve a note by id, visible only to its owner.
    async fn get_note(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Note>>;
}

// =============================================================================
// EMBEDDING STORE / VECTOR INDEX
// =============================================================================

/// Persists exactly one current vector per entity per collection.
///
/// Writing is also the push-based index update: once `set_embedding`
/// returns, the vector is visible to `VectorIndex::search`.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    /// Overwrite the entity's vector; last write wins. A write against
    /// an entity deleted concurrently is a silent drop, not an error.
    async fn set_embedding(
        &self,
        collection: EmbeddingCollection,
        entity_id: Uuid,
        vector: &Vector,
        model: &str,
    ) -> Result<()>;

    /// Fetch the entity's current vector. `None` means never embedded
    /// or embedding still in flight; callers treat it as "excluded from
    /// search", never as an error.
    async fn get_embedding(
        &self,
        collection: EmbeddingCollection,
        entity_id: Uuid,
    ) -> Result<Option<Vector>>;

    /// Remove the entity's vector (cascade-delete path).
    async fn delete_embedding(
        &self,
        collection: EmbeddingCollection,
        entity_id: Uuid,
    ) -> Result<()>;
}

/// Nearest-neighbor search over one embedded collection.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return the `k` nearest entities to `query`, score descending.
    /// An empty collection yields an empty list.
    async fn search(
        &self,
        collection: EmbeddingCollection,
        query: &Vector,
        k: i64,
    ) -> Result<Vec<VectorHit>>;
}

// =============================================================================
// EDGE REPOSITORY
// =============================================================================

/// Repository for directed canvas edges.
#[async_trait]
pub trait EdgeRepository: Send + Sync {
    /// Create an edge unless one with the same (source, target) pair
    /// already exists. Returns the new edge id, or `None` when the pair
    /// was already linked.
    async fn create(
        &self,
        source_id: Uuid,
        target_id: Uuid,
        label: Option<&str>,
    ) -> Result<Option<Uuid>>;

    /// Outgoing edges from a note, owner-checked on the source.
    async fn get_outgoing(&self, note_id: Uuid, owner_id: Uuid) -> Result<Vec<Edge>>;

    /// Incoming edges to a note, resolved to the referencing notes,
    /// owner-filtered, newest first.
    async fn get_incoming(&self, note_id: Uuid, owner_id: Uuid) -> Result<Vec<DirectBacklink>>;

    /// Delete a single edge the owner can see.
    async fn delete(&self, edge_id: Uuid, owner_id: Uuid) -> Result<()>;

    /// Delete every edge where the note is source or target.
    async fn delete_for_note(&self, note_id: Uuid) -> Result<()>;
}

// =============================================================================
// JOB REPOSITORY
// =============================================================================

/// Repository for job queue operations.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Queue a new job.
    async fn queue(
        &self,
        entity_id: Option<Uuid>,
        job_type: JobType,
        priority: i32,
        payload: Option<JsonValue>,
    ) -> Result<Uuid>;

    /// Queue a job unless one of the same type for the same entity is
    /// already pending or running. Returns `None` when deduplicated.
    async fn queue_deduplicated(
        &self,
        entity_id: Option<Uuid>,
        job_type: JobType,
        priority: i32,
        payload: Option<JsonValue>,
    ) -> Result<Option<Uuid>>;

    /// Claim the next pending job for processing.
    async fn claim_next(&self) -> Result<Option<Job>>;

    /// Claim the next pending job whose type is in `job_types`.
    /// An empty slice means "claim any type".
    async fn claim_next_for_types(&self, job_types: &[JobType]) -> Result<Option<Job>>;

    /// Update job progress.
    async fn update_progress(&self, job_id: Uuid, percent: i32, message: Option<&str>)
        -> Result<()>;

    /// Mark a job as completed.
    async fn complete(&self, job_id: Uuid, result: Option<JsonValue>) -> Result<()>;

    /// Record a failure: re-pend with an incremented retry count while
    /// retries remain, otherwise mark failed.
    async fn fail(&self, job_id: Uuid, error: &str) -> Result<()>;

    /// Get a job by ID.
    async fn get(&self, job_id: Uuid) -> Result<Option<Job>>;

    /// Pending jobs count.
    async fn pending_count(&self) -> Result<i64>;

    /// Queue statistics.
    async fn queue_stats(&self) -> Result<QueueStats>;
}

// =============================================================================
// EMBEDDING BACKEND
// =============================================================================

/// Backend for generating text embeddings.
///
/// Remote failures surface as `Error::Embedding`; the backend never
/// retries on its own — retry policy belongs to the caller (the job
/// worker for refreshes, the UI for interactive queries).
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts, one vector per input.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>>;

    /// The expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// The model name being used.
    fn model_name(&self) -> &str;

    /// Check if the backend is available and responding.
    async fn health_check(&self) -> Result<bool>;
}
