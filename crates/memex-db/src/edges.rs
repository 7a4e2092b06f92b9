//! Edge repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use memex_core::{new_v7, DirectBacklink, Edge, EdgeRepository, Error, Result};

use crate::notes::PgNoteRepository;

/// PostgreSQL implementation of EdgeRepository.
pub struct PgEdgeRepository {
    pool: Pool<Postgres>,
}

impl PgEdgeRepository {
    /// Create a new PgEdgeRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_edge_row(row: &sqlx::postgres::PgRow) -> Edge {
        Edge {
            id: row.get("id"),
            source_id: row.get("source_id"),
            target_id: row.get("target_id"),
            label: row.get("label"),
            created_at_utc: row.get("created_at_utc"),
        }
    }
}

#[async_trait]
impl EdgeRepository for PgEdgeRepository {
    async fn create(
        &self,
        source_id: Uuid,
        target_id: Uuid,
        label: Option<&str>,
    ) -> Result<Option<Uuid>> {
        let edge_id = new_v7();

        // Insert-unless-exists keyed on (source, target): re-running a
        // materialization is idempotent rather than piling up duplicates.
        let inserted = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO edge (id, source_id, target_id, label, created_at_utc)
             SELECT $1, $2, $3, $4, $5
             WHERE NOT EXISTS (
                 SELECT 1 FROM edge WHERE source_id = $2 AND target_id = $3
             )
             RETURNING id",
        )
        .bind(edge_id)
        .bind(source_id)
        .bind(target_id)
        .bind(label)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(inserted)
    }

    async fn get_outgoing(&self, note_id: Uuid, owner_id: Uuid) -> Result<Vec<Edge>> {
        let rows = sqlx::query(
            "SELECT e.id, e.source_id, e.target_id, e.label, e.created_at_utc
             FROM edge e
             JOIN note src ON src.id = e.source_id
             WHERE e.source_id = $1
               AND src.owner_id = $2 AND src.deleted_at IS NULL
             ORDER BY e.created_at_utc DESC",
        )
        .bind(note_id)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::parse_edge_row).collect())
    }

    async fn get_incoming(&self, note_id: Uuid, owner_id: Uuid) -> Result<Vec<DirectBacklink>> {
        // Both endpoints must be live notes of the requesting owner;
        // an edge from a foreign or deleted note is invisible here.
        let rows = sqlx::query(
            "SELECT e.id AS edge_id, e.label,
                    n.id, n.owner_id, n.title, n.content, n.position_x, n.position_y,
                    n.width, n.height, n.source, n.source_ref, n.parent_id,
                    n.created_at_utc, n.updated_at_utc
             FROM edge e
             JOIN note n ON n.id = e.source_id
             JOIN note tgt ON tgt.id = e.target_id
             WHERE e.target_id = $1
               AND n.owner_id = $2 AND n.deleted_at IS NULL
               AND tgt.owner_id = $2 AND tgt.deleted_at IS NULL
             ORDER BY e.created_at_utc DESC",
        )
        .bind(note_id)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let edge_id = row.get("edge_id");
                let label = row.get("label");
                DirectBacklink {
                    edge_id,
                    label,
                    note: PgNoteRepository::parse_note_row(row),
                }
            })
            .collect())
    }

    async fn delete(&self, edge_id: Uuid, owner_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM edge e
             USING note src
             WHERE e.id = $1 AND src.id = e.source_id AND src.owner_id = $2",
        )
        .bind(edge_id)
        .bind(owner_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("edge".to_string()));
        }
        Ok(())
    }

    async fn delete_for_note(&self, note_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM edge WHERE source_id = $1 OR target_id = $1")
            .bind(note_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
