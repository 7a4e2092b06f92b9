//! The relatedness engine: nearest-neighbor entities for a text query.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use memex_core::{
    defaults, EmbeddingBackend, EmbeddingCollection, EntityStore, Error, RankedMessage,
    RankedNote, RelatedEntities, Result, VectorIndex,
};

/// Computes ranked, owner-scoped related entities for a free-text query.
///
/// The engine is a pure query component (modulo the remote embedding
/// call): it persists nothing, is safely retryable, and never merges
/// across collections — each collection's top-k is independently
/// complete within its own type. Callers wanting one list use
/// [`RelatedEntities::merged`].
pub struct RelatednessEngine {
    embedder: Arc<dyn EmbeddingBackend>,
    index: Arc<dyn VectorIndex>,
    entities: Arc<dyn EntityStore>,
}

impl RelatednessEngine {
    /// Create a new engine over the given collaborators.
    pub fn new(
        embedder: Arc<dyn EmbeddingBackend>,
        index: Arc<dyn VectorIndex>,
        entities: Arc<dyn EntityStore>,
    ) -> Self {
        Self {
            embedder,
            index,
            entities,
        }
    }

    /// Find entities related to `query_text`, visible to `owner_id`.
    ///
    /// `limit` is the top-k per collection (default call sites use
    /// [`defaults::RELATED_LIMIT`]). Hits failing the ownership check
    /// are silently dropped, so returned counts may fall short of
    /// `limit`; an empty result is valid output, not an error.
    ///
    /// Embedding provider failures propagate unretried — retry policy
    /// belongs to the caller.
    #[instrument(
        skip(self, query_text),
        fields(subsystem = "search", component = "relatedness", op = "find_related")
    )]
    pub async fn find_related(
        &self,
        query_text: &str,
        owner_id: Uuid,
        limit: i64,
    ) -> Result<RelatedEntities> {
        let query_text = query_text.trim();
        if query_text.is_empty() {
            return Err(Error::InvalidInput(
                "query text must be non-empty".to_string(),
            ));
        }
        if limit < 1 {
            return Err(Error::InvalidInput("limit must be at least 1".to_string()));
        }

        let start = Instant::now();

        // One provider call per query, shared by both collection searches.
        let vectors = self.embedder.embed_texts(&[query_text.to_string()]).await?;
        let query_vec = vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("provider returned no vector".to_string()))?;

        let message_hits = self
            .index
            .search(EmbeddingCollection::Messages, &query_vec, limit)
            .await?;
        let note_hits = self
            .index
            .search(EmbeddingCollection::Notes, &query_vec, limit)
            .await?;

        // Resolve each hit through the owner-checked store. The index
        // returns hits score-descending; resolution preserves that
        // order, so each surviving list stays sorted.
        let mut dropped = 0usize;

        let mut messages = Vec::with_capacity(message_hits.len());
        for hit in message_hits {
            match self.entities.get_message(hit.entity_id, owner_id).await? {
                Some(message) => messages.push(RankedMessage {
                    message,
                    score: hit.score,
                }),
                None => dropped += 1,
            }
        }

        let mut notes = Vec::with_capacity(note_hits.len());
        for hit in note_hits {
            match self.entities.get_note(hit.entity_id, owner_id).await? {
                Some(note) => notes.push(RankedNote {
                    note,
                    score: hit.score,
                }),
                None => dropped += 1,
            }
        }

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            owner_id = %owner_id,
            result_count = messages.len() + notes.len(),
            dropped_count = dropped,
            duration_ms = elapsed,
            "Relatedness query complete"
        );
        if elapsed > 2000 {
            warn!(duration_ms = elapsed, slow = true, "Slow relatedness query");
        }

        Ok(RelatedEntities { messages, notes })
    }

    /// Find entities related to `query_text` with the default limit.
    pub async fn find_related_default(
        &self,
        query_text: &str,
        owner_id: Uuid,
    ) -> Result<RelatedEntities> {
        self.find_related(query_text, owner_id, defaults::RELATED_LIMIT)
            .await
    }
}
