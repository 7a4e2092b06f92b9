//! Job queue repository implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};
use tokio::sync::Notify;
use uuid::Uuid;

use memex_core::{new_v7, Error, Job, JobRepository, JobStatus, JobType, QueueStats, Result};

/// PostgreSQL implementation of JobRepository.
pub struct PgJobRepository {
    pool: Pool<Postgres>,
    /// Notify handle for event-driven worker wake.
    notify: Arc<Notify>,
}

impl PgJobRepository {
    /// Create a new PgJobRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            pool,
            notify: Arc::new(Notify::new()),
        }
    }

    /// Get the job notification handle for event-driven waking.
    pub fn job_notify(&self) -> Arc<Notify> {
        self.notify.clone()
    }

    /// Convert JobType to string for database.
    fn job_type_to_str(job_type: JobType) -> &'static str {
        match job_type {
            JobType::EmbedMessage => "embed_message",
            JobType::EmbedNote => "embed_note",
            JobType::LinkNote => "link_note",
        }
    }

    /// Convert string from database to JobType.
    fn str_to_job_type(s: &str) -> JobType {
        match s {
            "embed_message" => JobType::EmbedMessage,
            "link_note" => JobType::LinkNote,
            _ => JobType::EmbedNote, // fallback
        }
    }

    /// Convert string from database to JobStatus.
    fn str_to_job_status(s: &str) -> JobStatus {
        match s {
            "running" => JobStatus::Running,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Pending, // fallback
        }
    }

    /// Parse a job row into a Job struct.
    fn parse_job_row(row: sqlx::postgres::PgRow) -> Job {
        Job {
            id: row.get("id"),
            entity_id: row.get("entity_id"),
            job_type: Self::str_to_job_type(row.get("job_type")),
            status: Self::str_to_job_status(row.get("status")),
            priority: row.get("priority"),
            payload: row.get("payload"),
            result: row.get("result"),
            error_message: row.get("error_message"),
            progress_percent: row.get("progress_percent"),
            progress_message: row.get("progress_message"),
            retry_count: row.get("retry_count"),
            max_retries: row.get("max_retries"),
            created_at: row.get("created_at"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
        }
    }
}

const JOB_COLUMNS: &str = "id, entity_id, job_type::text, status::text, priority, payload, \
                           result, error_message, progress_percent, progress_message, \
                           retry_count, max_retries, created_at, started_at, completed_at";

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn queue(
        &self,
        entity_id: Option<Uuid>,
        job_type: JobType,
        priority: i32,
        payload: Option<JsonValue>,
    ) -> Result<Uuid> {
        let job_id = new_v7();

        sqlx::query(
            "INSERT INTO job_queue (id, entity_id, job_type, status, priority, payload,
                                    max_retries, created_at)
             VALUES ($1, $2, $3::job_type, 'pending'::job_status, $4, $5, $6, $7)",
        )
        .bind(job_id)
        .bind(entity_id)
        .bind(Self::job_type_to_str(job_type))
        .bind(priority)
        .bind(&payload)
        .bind(memex_core::defaults::JOB_MAX_RETRIES)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        self.notify.notify_waiters();
        Ok(job_id)
    }

    async fn queue_deduplicated(
        &self,
        entity_id: Option<Uuid>,
        job_type: JobType,
        priority: i32,
        payload: Option<JsonValue>,
    ) -> Result<Option<Uuid>> {
        let Some(eid) = entity_id else {
            // No entity id — nothing to deduplicate on, queue normally.
            let job_id = self.queue(entity_id, job_type, priority, payload).await?;
            return Ok(Some(job_id));
        };

        let job_type_str = Self::job_type_to_str(job_type);

        // Atomic check-and-insert: INSERT ... WHERE NOT EXISTS avoids
        // the TOCTOU race when two content mutations enqueue at once.
        let result = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO job_queue (id, entity_id, job_type, status, priority, payload,
                                    max_retries, created_at)
             SELECT $1, $2, $3::job_type, 'pending'::job_status, $4, $5, $6, $7
             WHERE NOT EXISTS (
                 SELECT 1 FROM job_queue
                 WHERE entity_id = $2 AND job_type = $3::job_type
                   AND status IN ('pending'::job_status, 'running'::job_status)
             )
             RETURNING id",
        )
        .bind(new_v7())
        .bind(eid)
        .bind(job_type_str)
        .bind(priority)
        .bind(&payload)
        .bind(memex_core::defaults::JOB_MAX_RETRIES)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.is_some() {
            self.notify.notify_waiters();
        }
        Ok(result)
    }

    async fn claim_next(&self) -> Result<Option<Job>> {
        self.claim_next_for_types(&[]).await
    }

    async fn claim_next_for_types(&self, job_types: &[JobType]) -> Result<Option<Job>> {
        let type_strings: Vec<String> = job_types
            .iter()
            .map(|jt| Self::job_type_to_str(*jt).to_string())
            .collect();

        // FOR UPDATE SKIP LOCKED allows concurrent workers to claim
        // without blocking each other. Empty array = claim any type.
        let query = format!(
            "UPDATE job_queue
             SET status = 'running'::job_status, started_at = $1
             WHERE id = (
                 SELECT id FROM job_queue
                 WHERE status = 'pending'::job_status
                   AND (cardinality($2::text[]) = 0 OR job_type::text = ANY($2))
                 ORDER BY priority DESC, created_at ASC
                 LIMIT 1
                 FOR UPDATE SKIP LOCKED
             )
             RETURNING {JOB_COLUMNS}"
        );

        let row = sqlx::query(&query)
            .bind(Utc::now())
            .bind(&type_strings)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(Self::parse_job_row))
    }

    async fn update_progress(
        &self,
        job_id: Uuid,
        percent: i32,
        message: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE job_queue SET progress_percent = $2, progress_message = $3
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(percent.clamp(0, 100))
        .bind(message)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn complete(&self, job_id: Uuid, result: Option<JsonValue>) -> Result<()> {
        sqlx::query(
            "UPDATE job_queue
             SET status = 'completed'::job_status, completed_at = $2, result = $3,
                 progress_percent = 100
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(Utc::now())
        .bind(&result)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn fail(&self, job_id: Uuid, error: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let (retry_count, max_retries): (i32, i32) =
            sqlx::query_as("SELECT retry_count, max_retries FROM job_queue WHERE id = $1")
                .bind(job_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(Error::Database)?;

        if retry_count < max_retries {
            // Retry: reset to pending with incremented retry count
            sqlx::query(
                "UPDATE job_queue
                 SET status = 'pending'::job_status, retry_count = $1, error_message = $2,
                     started_at = NULL, progress_percent = 0, progress_message = NULL
                 WHERE id = $3",
            )
            .bind(retry_count + 1)
            .bind(error)
            .bind(job_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        } else {
            // Max retries exceeded: mark as failed
            sqlx::query(
                "UPDATE job_queue
                 SET status = 'failed'::job_status, completed_at = $1, error_message = $2
                 WHERE id = $3",
            )
            .bind(Utc::now())
            .bind(error)
            .bind(job_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;

        // Re-pended jobs are claimable immediately
        if retry_count < max_retries {
            self.notify.notify_waiters();
        }
        Ok(())
    }

    async fn get(&self, job_id: Uuid) -> Result<Option<Job>> {
        let query = format!("SELECT {JOB_COLUMNS} FROM job_queue WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(Self::parse_job_row))
    }

    async fn pending_count(&self) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM job_queue WHERE status = 'pending'::job_status",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(row.get("count"))
    }

    async fn queue_stats(&self) -> Result<QueueStats> {
        let row = sqlx::query(
            "SELECT
                 COUNT(*) FILTER (WHERE status = 'pending'::job_status) AS pending,
                 COUNT(*) FILTER (WHERE status = 'running'::job_status) AS running,
                 COUNT(*) FILTER (WHERE status = 'completed'::job_status) AS completed,
                 COUNT(*) FILTER (WHERE status = 'failed'::job_status) AS failed,
                 COUNT(*) AS total
             FROM job_queue",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(QueueStats {
            pending: row.get("pending"),
            running: row.get("running"),
            completed: row.get("completed"),
            failed: row.get("failed"),
            total: row.get("total"),
        })
    }
}
