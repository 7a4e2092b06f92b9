//! # memex-db
//!
//! PostgreSQL database layer for memex.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for conversations, messages, notes,
//!   edges, and the job queue
//! - The embedding store / vector index over pgvector columns
//!
//! ## Example
//!
//! ```rust,ignore
//! use memex_db::Database;
//! use memex_core::{CreateNoteRequest, NoteRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/memex").await?;
//!     let owner = uuid::Uuid::new_v4();
//!
//!     let note_id = db
//!         .notes
//!         .insert(CreateNoteRequest::new(owner, "Hello, canvas!"))
//!         .await?;
//!
//!     println!("Created note: {}", note_id);
//!     Ok(())
//! }
//! ```

pub mod conversations;
pub mod edges;
pub mod embeddings;
pub mod jobs;
pub mod notes;
pub mod pool;

use async_trait::async_trait;
use uuid::Uuid;

// Re-export core types
pub use memex_core::*;

// Re-export repository implementations
pub use conversations::PgConversationRepository;
pub use edges::PgEdgeRepository;
pub use embeddings::PgEmbeddingRepository;
pub use jobs::PgJobRepository;
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Conversation/message repository.
    pub conversations: PgConversationRepository,
    /// Note repository.
    pub notes: PgNoteRepository,
    /// Embedding store + vector index.
    pub embeddings: PgEmbeddingRepository,
    /// Edge repository.
    pub edges: PgEdgeRepository,
    /// Job queue repository.
    pub jobs: PgJobRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            conversations: PgConversationRepository::new(pool.clone()),
            notes: PgNoteRepository::new(pool.clone()),
            embeddings: PgEmbeddingRepository::new(pool.clone()),
            edges: PgEdgeRepository::new(pool.clone()),
            jobs: PgJobRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Delete a note and cascade: every edge where it is source or
    /// target goes, and so does its vector. After this, former
    /// neighbors' backlink queries no longer list the note.
    pub async fn delete_note(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        self.notes.soft_delete(id, owner_id).await?;
        self.edges.delete_for_note(id).await?;
        self.embeddings
            .delete_embedding(EmbeddingCollection::Notes, id)
            .await?;
        Ok(())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

/// Owner-checked entity resolution backed by the repositories.
#[async_trait]
impl EntityStore for Database {
    async fn get_message(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Message>> {
        self.conversations.get_message(id, owner_id).await
    }

    async fn get_note(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Note>> {
        self.notes.fetch(id, owner_id).await
    }
}
