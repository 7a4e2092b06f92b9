//! Link materializer: turns relatedness results into persisted edges.

use std::sync::Arc;

use tracing::{debug, instrument};
use uuid::Uuid;

use memex_core::{EdgeRepository, RelatedEntities, Result};

/// Format a similarity score as a percentage label, e.g. `0.87` → `"87%"`.
///
/// Rounds to the nearest percent; inputs are clamped into [0, 1] first.
pub fn format_score_label(score: f32) -> String {
    let pct = (score.clamp(0.0, 1.0) * 100.0).round() as i32;
    format!("{}%", pct)
}

/// Persists relatedness results as labeled canvas edges.
///
/// Only note hits materialize: messages are not canvas entities, so
/// related messages pass through the engine's output untouched but
/// never become edges.
pub struct LinkMaterializer {
    edges: Arc<dyn EdgeRepository>,
    label_formatter: fn(f32) -> String,
}

impl LinkMaterializer {
    /// Create a materializer with the default percentage labels.
    pub fn new(edges: Arc<dyn EdgeRepository>) -> Self {
        Self {
            edges,
            label_formatter: format_score_label,
        }
    }

    /// Override how scores become edge labels.
    pub fn with_label_formatter(mut self, formatter: fn(f32) -> String) -> Self {
        self.label_formatter = formatter;
        self
    }

    /// Create an edge from `source_note_id` to every related note,
    /// labeled with its score.
    ///
    /// The source itself is excluded by id (never by content), so a
    /// note whose own text seeded the query cannot link to itself.
    /// Edges are created one at a time and are not transactional: a
    /// failure partway leaves the already-created subset in place,
    /// which is acceptable because re-materializing is idempotent
    /// (duplicate pairs are skipped by the repository).
    ///
    /// Returns the ids of edges actually created this call.
    #[instrument(
        skip(self, related),
        fields(subsystem = "search", component = "linker", op = "materialize")
    )]
    pub async fn materialize(
        &self,
        source_note_id: Uuid,
        related: &RelatedEntities,
    ) -> Result<Vec<Uuid>> {
        self.materialize_above(source_note_id, related, 0.0).await
    }

    /// Like [`materialize`](Self::materialize), but skips hits scoring
    /// below `min_score`. Used by the auto-linking job with
    /// [`memex_core::defaults::AUTO_LINK_THRESHOLD`].
    pub async fn materialize_above(
        &self,
        source_note_id: Uuid,
        related: &RelatedEntities,
        min_score: f32,
    ) -> Result<Vec<Uuid>> {
        let mut created = Vec::new();

        for ranked in &related.notes {
            if ranked.note.id == source_note_id {
                continue;
            }
            if ranked.score < min_score {
                continue;
            }

            let label = (self.label_formatter)(ranked.score);
            if let Some(edge_id) = self
                .edges
                .create(source_note_id, ranked.note.id, Some(&label))
                .await?
            {
                created.push(edge_id);
            }
        }

        debug!(
            note_id = %source_note_id,
            result_count = created.len(),
            "Materialized links"
        );
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_score_label_rounds_to_percent() {
        assert_eq!(format_score_label(0.87), "87%");
        assert_eq!(format_score_label(0.874), "87%");
        assert_eq!(format_score_label(0.875), "88%");
        assert_eq!(format_score_label(0.9), "90%");
    }

    #[test]
    fn test_format_score_label_bounds() {
        assert_eq!(format_score_label(0.0), "0%");
        assert_eq!(format_score_label(1.0), "100%");
        assert_eq!(format_score_label(-0.3), "0%");
        assert_eq!(format_score_label(1.7), "100%");
    }
}
