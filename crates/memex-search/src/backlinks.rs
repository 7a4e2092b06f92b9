//! Backlink resolution: who points at this note?
//!
//! Two deliberately independent mechanisms coexist:
//! - **direct** backlinks follow the edge table (canvas connections and
//!   auto-created semantic links);
//! - **wiki** backlinks scan note content for `[[Title]]` references.
//!
//! Neither is derived from the other: the text scan is ground truth for
//! wiki references, the edge table for canvas links.

use std::sync::Arc;

use tracing::{debug, instrument};
use uuid::Uuid;

use memex_core::{defaults, DirectBacklink, EdgeRepository, Note, NoteRepository, Result};

use crate::wikilink::{extract_wiki_link_targets, normalize_title_key};

/// Read-only backlink queries for the backlinks panel. Both forms are
/// pure reads, cheap enough to run on every panel render.
pub struct BacklinkResolver {
    edges: Arc<dyn EdgeRepository>,
    notes: Arc<dyn NoteRepository>,
}

impl BacklinkResolver {
    /// Create a resolver over the given repositories.
    pub fn new(edges: Arc<dyn EdgeRepository>, notes: Arc<dyn NoteRepository>) -> Self {
        Self { edges, notes }
    }

    /// Notes that are the source of an edge targeting `note_id`,
    /// owner-filtered, with the edge label attached for display.
    pub async fn direct_backlinks(
        &self,
        note_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Vec<DirectBacklink>> {
        self.edges.get_incoming(note_id, owner_id).await
    }

    /// The owner's notes whose content references `title` through a
    /// wiki-link, case-insensitively. The note titled `title` itself is
    /// excluded (self-reference guard).
    #[instrument(
        skip(self, title),
        fields(subsystem = "search", component = "backlinks", op = "wiki_backlinks")
    )]
    pub async fn wiki_backlinks(&self, owner_id: Uuid, title: &str) -> Result<Vec<Note>> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(Vec::new());
        }
        let key = normalize_title_key(title);

        // The repository ILIKE prefilter over-approximates; confirm
        // each candidate with the exact extractor before reporting it.
        let candidates = self.notes.scan_wiki_candidates(owner_id, title).await?;
        let candidate_count = candidates.len();

        let referencing: Vec<Note> = candidates
            .into_iter()
            .filter(|note| {
                let own_title = note.title.as_deref().map(normalize_title_key);
                if own_title.as_deref() == Some(key.as_str()) {
                    return false;
                }
                extract_wiki_link_targets(&note.content, defaults::WIKI_LINK_MAX_TARGETS)
                    .iter()
                    .any(|target| normalize_title_key(target) == key)
            })
            .collect();

        debug!(
            owner_id = %owner_id,
            result_count = referencing.len(),
            dropped_count = candidate_count - referencing.len(),
            "Wiki backlink scan complete"
        );
        Ok(referencing)
    }
}
