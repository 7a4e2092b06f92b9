//! Auto-linking handler: relatedness query + edge materialization.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use memex_core::{defaults, Error, JobType};
use memex_db::Database;
use memex_search::{LinkMaterializer, RelatednessEngine};

use crate::handler::{JobContext, JobHandler, JobResult};

/// Runs the relatedness engine on a note's content and persists edges
/// to every sufficiently similar note.
pub struct LinkNoteHandler {
    db: Database,
    engine: Arc<RelatednessEngine>,
    materializer: LinkMaterializer,
    min_score: f32,
}

impl LinkNoteHandler {
    pub fn new(db: Database, engine: Arc<RelatednessEngine>) -> Self {
        let materializer =
            LinkMaterializer::new(Arc::new(memex_db::PgEdgeRepository::new(db.pool().clone())));
        Self {
            db,
            engine,
            materializer,
            min_score: defaults::AUTO_LINK_THRESHOLD,
        }
    }

    /// Override the similarity threshold for edge creation.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }
}

#[async_trait]
impl JobHandler for LinkNoteHandler {
    fn job_type(&self) -> JobType {
        JobType::LinkNote
    }

    async fn execute(&self, ctx: JobContext) -> JobResult {
        let Some(note_id) = ctx.entity_id() else {
            return JobResult::Failed("link_note job has no entity id".to_string());
        };

        let note = match self.db.notes.fetch_unscoped(note_id).await {
            Ok(Some(note)) => note,
            Ok(None) => {
                debug!(note_id = %note_id, "Note vanished before linking; skipping");
                return JobResult::Success(Some(json!({"skipped": "entity deleted"})));
            }
            Err(e) => return JobResult::Failed(e.to_string()),
        };

        if note.content.trim().is_empty() {
            return JobResult::Success(Some(json!({"skipped": "empty content"})));
        }

        ctx.report_progress(25, Some("Finding related notes"));

        // The note's own content seeds the query; its owner scopes the
        // results, so edges never cross owners.
        let related = match self
            .engine
            .find_related(&note.content, note.owner_id, defaults::RELATED_LIMIT)
            .await
        {
            Ok(related) => related,
            Err(e @ Error::Embedding(_)) => return JobResult::Retry(e.to_string()),
            Err(e) => return JobResult::Failed(e.to_string()),
        };

        ctx.report_progress(75, Some("Materializing links"));

        match self
            .materializer
            .materialize_above(note_id, &related, self.min_score)
            .await
        {
            Ok(created) => JobResult::Success(Some(json!({ "created": created.len() }))),
            Err(e) => JobResult::Failed(e.to_string()),
        }
    }
}
