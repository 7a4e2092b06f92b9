//! Conversation and message repository implementation.
//!
//! A message has no owner column of its own: ownership is derived
//! through its conversation, so every message read joins `conversation`
//! and filters on `owner_id`.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use memex_core::{new_v7, Conversation, ConversationRepository, Error, Message, Result, Role};

/// PostgreSQL implementation of ConversationRepository.
pub struct PgConversationRepository {
    pool: Pool<Postgres>,
}

impl PgConversationRepository {
    /// Create a new PgConversationRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_role(s: &str) -> Role {
        match s {
            "assistant" => Role::Assistant,
            _ => Role::User, // column is CHECK-constrained
        }
    }

    fn parse_message_row(row: sqlx::postgres::PgRow) -> Message {
        Message {
            id: row.get("id"),
            conversation_id: row.get("conversation_id"),
            role: Self::parse_role(row.get("role")),
            content: row.get("content"),
            created_at_utc: row.get("created_at_utc"),
        }
    }

    /// System read for the job worker: no owner scoping. Never exposed
    /// through a request path.
    pub async fn get_message_unscoped(&self, id: Uuid) -> Result<Option<Message>> {
        let row = sqlx::query(
            "SELECT id, conversation_id, role, content, created_at_utc
             FROM message WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_message_row))
    }

    /// Owner-checked message lookup. Returns `None` for a missing
    /// message and for a message in someone else's conversation alike.
    pub async fn get_message(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Message>> {
        let row = sqlx::query(
            "SELECT m.id, m.conversation_id, m.role, m.content, m.created_at_utc
             FROM message m
             JOIN conversation c ON c.id = m.conversation_id
             WHERE m.id = $1 AND c.owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_message_row))
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    async fn create(&self, owner_id: Uuid, title: Option<&str>) -> Result<Uuid> {
        let id = new_v7();
        sqlx::query(
            "INSERT INTO conversation (id, owner_id, title, created_at_utc)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(owner_id)
        .bind(title)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn get(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Conversation>> {
        let row = sqlx::query(
            "SELECT id, owner_id, title, created_at_utc
             FROM conversation
             WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|row| Conversation {
            id: row.get("id"),
            owner_id: row.get("owner_id"),
            title: row.get("title"),
            created_at_utc: row.get("created_at_utc"),
        }))
    }

    async fn append_message(
        &self,
        conversation_id: Uuid,
        owner_id: Uuid,
        role: Role,
        content: &str,
    ) -> Result<Uuid> {
        let id = new_v7();

        // Guarded insert: the row only lands if the conversation exists
        // and belongs to the requesting owner.
        let inserted = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO message (id, conversation_id, role, content, created_at_utc)
             SELECT $1, $2, $3, $4, $5
             WHERE EXISTS (
                 SELECT 1 FROM conversation WHERE id = $2 AND owner_id = $6
             )
             RETURNING id",
        )
        .bind(id)
        .bind(conversation_id)
        .bind(role.to_string())
        .bind(content)
        .bind(Utc::now())
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        inserted.ok_or_else(|| Error::NotFound("conversation".to_string()))
    }

    async fn list_messages(&self, conversation_id: Uuid, owner_id: Uuid) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT m.id, m.conversation_id, m.role, m.content, m.created_at_utc
             FROM message m
             JOIN conversation c ON c.id = m.conversation_id
             WHERE m.conversation_id = $1 AND c.owner_id = $2
             ORDER BY m.created_at_utc ASC",
        )
        .bind(conversation_id)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_message_row).collect())
    }
}
