//! Embedding store and vector index implementation.
//!
//! One row per entity per collection; upserting a row is the push-based
//! index update, so a vector becomes searchable the moment
//! `set_embedding` commits.

use async_trait::async_trait;
use chrono::Utc;
use pgvector::Vector;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use memex_core::{EmbeddingCollection, EmbeddingStore, Error, Result, VectorHit, VectorIndex};

/// PostgreSQL implementation of EmbeddingStore and VectorIndex over the
/// `message_embedding` and `note_embedding` tables.
pub struct PgEmbeddingRepository {
    pool: Pool<Postgres>,
}

impl PgEmbeddingRepository {
    /// Create a new PgEmbeddingRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmbeddingStore for PgEmbeddingRepository {
    async fn set_embedding(
        &self,
        collection: EmbeddingCollection,
        entity_id: Uuid,
        vector: &Vector,
        model: &str,
    ) -> Result<()> {
        // The EXISTS guard makes a write against a concurrently deleted
        // entity a zero-row no-op instead of an FK violation.
        let query = match collection {
            EmbeddingCollection::Messages => {
                "INSERT INTO message_embedding (message_id, vector, model, created_at)
                 SELECT $1, $2, $3, $4
                 WHERE EXISTS (SELECT 1 FROM message WHERE id = $1)
                 ON CONFLICT (message_id) DO UPDATE
                 SET vector = EXCLUDED.vector, model = EXCLUDED.model,
                     created_at = EXCLUDED.created_at"
            }
            EmbeddingCollection::Notes => {
                "INSERT INTO note_embedding (note_id, vector, model, created_at)
                 SELECT $1, $2, $3, $4
                 WHERE EXISTS (SELECT 1 FROM note WHERE id = $1 AND deleted_at IS NULL)
                 ON CONFLICT (note_id) DO UPDATE
                 SET vector = EXCLUDED.vector, model = EXCLUDED.model,
                     created_at = EXCLUDED.created_at"
            }
        };

        let result = sqlx::query(query)
            .bind(entity_id)
            .bind(vector)
            .bind(model)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            debug!(
                subsystem = "db",
                component = "embeddings",
                op = "set_embedding",
                entity_id = %entity_id,
                "Entity vanished before embedding write; dropped"
            );
        }

        Ok(())
    }

    async fn get_embedding(
        &self,
        collection: EmbeddingCollection,
        entity_id: Uuid,
    ) -> Result<Option<Vector>> {
        let query = match collection {
            EmbeddingCollection::Messages => {
                "SELECT vector FROM message_embedding WHERE message_id = $1"
            }
            EmbeddingCollection::Notes => "SELECT vector FROM note_embedding WHERE note_id = $1",
        };

        let row = sqlx::query(query)
            .bind(entity_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|row| row.get("vector")))
    }

    async fn delete_embedding(
        &self,
        collection: EmbeddingCollection,
        entity_id: Uuid,
    ) -> Result<()> {
        let query = match collection {
            EmbeddingCollection::Messages => {
                "DELETE FROM message_embedding WHERE message_id = $1"
            }
            EmbeddingCollection::Notes => "DELETE FROM note_embedding WHERE note_id = $1",
        };

        sqlx::query(query)
            .bind(entity_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for PgEmbeddingRepository {
    async fn search(
        &self,
        collection: EmbeddingCollection,
        query: &Vector,
        k: i64,
    ) -> Result<Vec<VectorHit>> {
        // Cosine distance via pgvector `<=>`, reported as similarity.
        // The index is not owner-scoped; ownership is enforced when hits
        // are resolved through the EntityStore.
        let sql = match collection {
            EmbeddingCollection::Messages => {
                "SELECT e.message_id AS entity_id,
                        1.0 - (e.vector <=> $1::vector) AS score
                 FROM message_embedding e
                 ORDER BY e.vector <=> $1::vector
                 LIMIT $2"
            }
            EmbeddingCollection::Notes => {
                "SELECT e.note_id AS entity_id,
                        1.0 - (e.vector <=> $1::vector) AS score
                 FROM note_embedding e
                 JOIN note n ON n.id = e.note_id
                 WHERE n.deleted_at IS NULL
                 ORDER BY e.vector <=> $1::vector
                 LIMIT $2"
            }
        };

        let rows = sqlx::query(sql)
            .bind(query)
            .bind(k)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| VectorHit {
                entity_id: row.get("entity_id"),
                score: row.get::<f64, _>("score") as f32,
            })
            .collect())
    }
}
