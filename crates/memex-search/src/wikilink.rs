//! Wiki-link extraction and resolution.
//!
//! Notes reference each other by title with `[[Title]]` syntax, with
//! optional alias (`[[Title|shown text]]`) and heading (`[[Title#Section]]`)
//! suffixes. Resolution is deterministic title lookup — no embedding or
//! relatedness computation is part of this flow.

use std::sync::Arc;

use tracing::{debug, instrument};
use uuid::Uuid;

use memex_core::{
    defaults, CreateNoteRequest, Error, NoteRepository, NoteSource, Result, TitleSuggestion,
    WikiLinkResolution,
};

/// Extract wiki-link target titles from note content, in order of
/// appearance, capped at `max_targets`. Alias and heading suffixes are
/// stripped; empty targets and unterminated brackets are skipped.
pub fn extract_wiki_link_targets(content: &str, max_targets: usize) -> Vec<String> {
    if max_targets == 0 || content.is_empty() {
        return Vec::new();
    }

    let mut targets = Vec::new();
    let mut cursor = 0usize;

    while cursor < content.len() && targets.len() < max_targets {
        let Some(open_rel) = content[cursor..].find("[[") else {
            break;
        };
        let target_start = cursor + open_rel + 2;
        let Some(close_rel) = content[target_start..].find("]]") else {
            break;
        };
        let target_end = target_start + close_rel;
        cursor = target_end + 2;

        let raw = &content[target_start..target_end];
        // `[[Title|alias]]` links by Title; `[[Title#Section]]` links
        // to the note, not the section.
        let without_alias = raw.split_once('|').map_or(raw, |(left, _)| left);
        let target = without_alias
            .split_once('#')
            .map_or(without_alias, |(left, _)| left)
            .trim();

        if !target.is_empty() {
            targets.push(target.to_string());
        }
    }

    targets
}

/// Normalize a title for comparison: case-insensitive, internal
/// whitespace collapsed to single spaces.
pub fn normalize_title_key(value: &str) -> String {
    value
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves typed wiki-links against the owner's notes.
///
/// The suggestion path is a plain injected dependency: construct one
/// resolver per note store and pass it where the editor needs it.
/// Keystroke-driven calls to [`suggest`](Self::suggest) should be
/// debounced at the caller ([`defaults::SUGGEST_DEBOUNCE_MS`]).
pub struct WikiLinkResolver {
    notes: Arc<dyn NoteRepository>,
}

impl WikiLinkResolver {
    /// Create a resolver over the given note store.
    pub fn new(notes: Arc<dyn NoteRepository>) -> Self {
        Self { notes }
    }

    /// Titles matching the typed fragment: case-insensitive substring
    /// match, original creation order, capped at
    /// [`defaults::SUGGEST_LIMIT`]. An empty fragment suggests nothing.
    pub async fn suggest(&self, owner_id: Uuid, fragment: &str) -> Result<Vec<TitleSuggestion>> {
        if fragment.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.notes
            .suggest_titles(owner_id, fragment, defaults::SUGGEST_LIMIT)
            .await
    }

    /// Resolve a picked title: exact case-insensitive match navigates
    /// to the existing note; otherwise a new note is created with the
    /// title as its heading. Either way the result carries the note id
    /// to navigate to.
    #[instrument(
        skip(self, title),
        fields(subsystem = "search", component = "wikilink", op = "resolve")
    )]
    pub async fn resolve_or_create(
        &self,
        owner_id: Uuid,
        title: &str,
    ) -> Result<WikiLinkResolution> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput(
                "wiki-link title must be non-empty".to_string(),
            ));
        }

        if let Some(existing) = self.notes.find_by_title(owner_id, title).await? {
            return Ok(WikiLinkResolution::Existing(existing.id));
        }

        let req = CreateNoteRequest {
            title: Some(title.to_string()),
            content: format!("# {}\n", title),
            source: NoteSource::Manual,
            ..CreateNoteRequest::new(owner_id, "")
        };
        let id = self.notes.insert(req).await?;

        debug!(note_id = %id, "Created note for unresolved wiki-link");
        Ok(WikiLinkResolution::Created(id))
    }
}
