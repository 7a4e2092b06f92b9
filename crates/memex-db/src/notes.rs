//! Canvas note repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use memex_core::{
    new_v7, CreateNoteRequest, Error, Note, NoteRepository, Result, TitleSuggestion,
};

use crate::escape_like;

/// PostgreSQL implementation of NoteRepository.
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub(crate) fn parse_note_row(row: sqlx::postgres::PgRow) -> Note {
        let source: String = row.get("source");
        Note {
            id: row.get("id"),
            owner_id: row.get("owner_id"),
            title: row.get("title"),
            content: row.get("content"),
            position_x: row.get("position_x"),
            position_y: row.get("position_y"),
            width: row.get("width"),
            height: row.get("height"),
            source: source.parse().unwrap_or_default(),
            source_ref: row.get("source_ref"),
            parent_id: row.get("parent_id"),
            created_at_utc: row.get("created_at_utc"),
            updated_at_utc: row.get("updated_at_utc"),
        }
    }

    /// Shared owner-scoped update guard: affects 0 rows when the note
    /// is absent, soft-deleted, or not the owner's, all collapsed into
    /// the same `NotFound`.
    fn check_updated(result: sqlx::postgres::PgQueryResult) -> Result<()> {
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("note".to_string()));
        }
        Ok(())
    }

    /// System read for the job worker: no owner scoping. Never exposed
    /// through a request path.
    pub async fn fetch_unscoped(&self, id: Uuid) -> Result<Option<Note>> {
        let query = format!(
            "SELECT {NOTE_COLUMNS} FROM note
             WHERE id = $1 AND deleted_at IS NULL"
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(Self::parse_note_row))
    }
}

const NOTE_COLUMNS: &str = "id, owner_id, title, content, position_x, position_y, \
                            width, height, source, source_ref, parent_id, \
                            created_at_utc, updated_at_utc";

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, req: CreateNoteRequest) -> Result<Uuid> {
        let id = new_v7();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO note (id, owner_id, title, content, position_x, position_y,
                               width, height, source, source_ref, parent_id,
                               created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)",
        )
        .bind(id)
        .bind(req.owner_id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(req.position_x)
        .bind(req.position_y)
        .bind(req.width)
        .bind(req.height)
        .bind(req.source.to_string())
        .bind(&req.source_ref)
        .bind(req.parent_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn fetch(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Note>> {
        let query = format!(
            "SELECT {NOTE_COLUMNS} FROM note
             WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL"
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(Self::parse_note_row))
    }

    async fn update_content(&self, id: Uuid, owner_id: Uuid, content: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE note SET content = $3, updated_at_utc = $4
             WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(owner_id)
        .bind(content)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Self::check_updated(result)
    }

    async fn update_title(&self, id: Uuid, owner_id: Uuid, title: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE note SET title = $3, updated_at_utc = $4
             WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(owner_id)
        .bind(title)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Self::check_updated(result)
    }

    async fn update_geometry(
        &self,
        id: Uuid,
        owner_id: Uuid,
        position_x: f64,
        position_y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE note
             SET position_x = $3, position_y = $4, width = $5, height = $6,
                 updated_at_utc = $7
             WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(owner_id)
        .bind(position_x)
        .bind(position_y)
        .bind(width)
        .bind(height)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Self::check_updated(result)
    }

    async fn soft_delete(&self, id: Uuid, owner_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE note SET deleted_at = $3
             WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(owner_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Self::check_updated(result)
    }

    async fn find_by_title(&self, owner_id: Uuid, title: &str) -> Result<Option<Note>> {
        let query = format!(
            "SELECT {NOTE_COLUMNS} FROM note
             WHERE owner_id = $1 AND deleted_at IS NULL
               AND title IS NOT NULL
               AND lower(btrim(title)) = lower(btrim($2))
             ORDER BY created_at_utc ASC
             LIMIT 1"
        );
        let row = sqlx::query(&query)
            .bind(owner_id)
            .bind(title)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(Self::parse_note_row))
    }

    async fn suggest_titles(
        &self,
        owner_id: Uuid,
        fragment: &str,
        limit: i64,
    ) -> Result<Vec<TitleSuggestion>> {
        let pattern = format!("%{}%", escape_like(fragment.trim()));

        // Creation order == UUIDv7 order: suggestions appear in the
        // order the notes were created, not by match quality.
        let rows = sqlx::query(
            "SELECT id, title FROM note
             WHERE owner_id = $1 AND deleted_at IS NULL
               AND title IS NOT NULL
               AND title ILIKE $2
             ORDER BY created_at_utc ASC
             LIMIT $3",
        )
        .bind(owner_id)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| TitleSuggestion {
                note_id: row.get("id"),
                title: row.get("title"),
            })
            .collect())
    }

    async fn scan_wiki_candidates(&self, owner_id: Uuid, title: &str) -> Result<Vec<Note>> {
        let pattern = format!("%[[%{}%", escape_like(title.trim()));

        // ILIKE prefilter only; the caller re-scans candidate content
        // with the exact wiki-link extractor before reporting a backlink.
        let query = format!(
            "SELECT {NOTE_COLUMNS} FROM note
             WHERE owner_id = $1 AND deleted_at IS NULL
               AND content LIKE '%[[%'
               AND content ILIKE $2
             ORDER BY created_at_utc ASC"
        );
        let rows = sqlx::query(&query)
            .bind(owner_id)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_note_row).collect())
    }
}
