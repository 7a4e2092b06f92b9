//! Core data models for memex.
//!
//! These types are shared across all memex crates and represent the
//! embeddable entities (messages, canvas notes), the edges between them,
//! and the job queue records that drive background embedding refresh.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

pub use pgvector::Vector;

// =============================================================================
// CONVERSATION / MESSAGE TYPES
// =============================================================================

/// Author role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// A chat conversation. Owns its messages: a message's owner is the
/// owner of its conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: Option<String>,
    pub created_at_utc: DateTime<Utc>,
}

/// A single chat message inside a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at_utc: DateTime<Utc>,
}

// =============================================================================
// NOTE TYPES
// =============================================================================

/// Provenance of a canvas note's content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteSource {
    /// Typed directly by the user (default)
    #[default]
    Manual,
    /// Transcribed voice note
    Voice,
    /// Saved from a chat exchange
    Chat,
    /// Extracted by the assistant from other content
    AiExtracted,
    /// Imported web page
    Web,
    /// Imported YouTube transcript
    Youtube,
    /// Imported Readwise highlight
    Readwise,
}

impl std::fmt::Display for NoteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Manual => "manual",
            Self::Voice => "voice",
            Self::Chat => "chat",
            Self::AiExtracted => "ai_extracted",
            Self::Web => "web",
            Self::Youtube => "youtube",
            Self::Readwise => "readwise",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for NoteSource {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "voice" => Ok(Self::Voice),
            "chat" => Ok(Self::Chat),
            "ai_extracted" => Ok(Self::AiExtracted),
            "web" => Ok(Self::Web),
            "youtube" => Ok(Self::Youtube),
            "readwise" => Ok(Self::Readwise),
            _ => Err(format!("Invalid note source: {}", s)),
        }
    }
}

/// A canvas note: freeform positioned content, optionally titled,
/// optionally linked to a parent note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: Option<String>,
    pub content: String,
    pub position_x: f64,
    pub position_y: f64,
    pub width: f64,
    pub height: f64,
    pub source: NoteSource,
    /// Reference back to the imported origin (URL, video id, highlight id).
    pub source_ref: Option<String>,
    pub parent_id: Option<Uuid>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

/// Request for creating a new canvas note.
#[derive(Debug, Clone)]
pub struct CreateNoteRequest {
    pub owner_id: Uuid,
    pub title: Option<String>,
    pub content: String,
    pub position_x: f64,
    pub position_y: f64,
    pub width: f64,
    pub height: f64,
    pub source: NoteSource,
    pub source_ref: Option<String>,
    pub parent_id: Option<Uuid>,
}

impl CreateNoteRequest {
    /// Minimal request: content only, placed at the canvas origin.
    pub fn new(owner_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            owner_id,
            title: None,
            content: content.into(),
            position_x: 0.0,
            position_y: 0.0,
            width: crate::defaults::NOTE_WIDTH,
            height: crate::defaults::NOTE_HEIGHT,
            source: NoteSource::Manual,
            source_ref: None,
            parent_id: None,
        }
    }
}

// =============================================================================
// EDGE TYPES
// =============================================================================

/// Directed edge between two canvas notes.
///
/// Auto-created edges carry a similarity percentage label ("87%");
/// user-drawn edges usually have no label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: Uuid,
    pub source_id: Uuid,
    pub target_id: Uuid,
    pub label: Option<String>,
    pub created_at_utc: DateTime<Utc>,
}

/// An incoming edge resolved for the backlinks panel: the referencing
/// note together with the edge's display label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectBacklink {
    pub edge_id: Uuid,
    pub label: Option<String>,
    pub note: Note,
}

// =============================================================================
// SEARCH TYPES
// =============================================================================

/// Which embedded collection a vector search targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingCollection {
    Messages,
    Notes,
}

/// A raw nearest-neighbor hit from the vector index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorHit {
    pub entity_id: Uuid,
    /// Similarity in [0, 1]; higher is more similar.
    pub score: f32,
}

/// A chat message hit with its similarity score attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedMessage {
    pub message: Message,
    pub score: f32,
}

/// A canvas note hit with its similarity score attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedNote {
    pub note: Note,
    pub score: f32,
}

/// A single entry in a cross-collection merge of relatedness results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RelatedHit {
    Message(RankedMessage),
    Note(RankedNote),
}

impl RelatedHit {
    pub fn score(&self) -> f32 {
        match self {
            Self::Message(m) => m.score,
            Self::Note(n) => n.score,
        }
    }

    pub fn entity_id(&self) -> Uuid {
        match self {
            Self::Message(m) => m.message.id,
            Self::Note(n) => n.note.id,
        }
    }
}

/// Result of a relatedness query: the two collections' top-k lists,
/// each independently sorted by score descending.
///
/// The engine never merges across collections; each list's top-k is
/// complete within its own type. Callers that want one ranked list use
/// [`RelatedEntities::merged`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelatedEntities {
    pub messages: Vec<RankedMessage>,
    pub notes: Vec<RankedNote>,
}

impl RelatedEntities {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.notes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len() + self.notes.len()
    }

    /// Caller-side cross-collection merge, score descending.
    pub fn merged(&self) -> Vec<RelatedHit> {
        let mut hits: Vec<RelatedHit> = self
            .messages
            .iter()
            .cloned()
            .map(RelatedHit::Message)
            .chain(self.notes.iter().cloned().map(RelatedHit::Note))
            .collect();
        hits.sort_by(|a, b| {
            b.score()
                .partial_cmp(&a.score())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits
    }
}

// =============================================================================
// WIKI-LINK TYPES
// =============================================================================

/// A note title offered while the user is typing a wiki-link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleSuggestion {
    pub note_id: Uuid,
    pub title: String,
}

/// Outcome of resolving a wiki-link target title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "note_id", rename_all = "lowercase")]
pub enum WikiLinkResolution {
    /// An existing note matched the title (case-insensitive).
    Existing(Uuid),
    /// No match existed; a new note was created with the title as heading.
    Created(Uuid),
}

impl WikiLinkResolution {
    /// The note id to navigate to, regardless of how it was resolved.
    pub fn target_id(&self) -> Uuid {
        match self {
            Self::Existing(id) | Self::Created(id) => *id,
        }
    }
}

// =============================================================================
// JOB TYPES
// =============================================================================

/// Status of a job in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Type of background job to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Recompute the embedding for a chat message
    EmbedMessage,
    /// Recompute the embedding for a canvas note
    EmbedNote,
    /// Find related notes and materialize edges
    LinkNote,
}

impl JobType {
    /// Default priority for this job type (higher = more urgent).
    pub fn default_priority(&self) -> i32 {
        match self {
            // Embedding gates search freshness, so it outranks linking
            JobType::EmbedMessage => 5,
            JobType::EmbedNote => 5,
            JobType::LinkNote => 3,
        }
    }
}

/// A job in the processing queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    /// The message or note this job operates on; which it is follows
    /// from `job_type`.
    pub entity_id: Option<Uuid>,
    pub job_type: JobType,
    pub status: JobStatus,
    pub priority: i32,
    pub payload: Option<JsonValue>,
    pub result: Option<JsonValue>,
    pub error_message: Option<String>,
    pub progress_percent: i32,
    pub progress_message: Option<String>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Queue statistics summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStats {
    pub pending: i64,
    pub running: i64,
    pub completed: i64,
    pub failed: i64,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(score: f32) -> RankedMessage {
        RankedMessage {
            message: Message {
                id: Uuid::new_v4(),
                conversation_id: Uuid::new_v4(),
                role: Role::User,
                content: "hello".to_string(),
                created_at_utc: Utc::now(),
            },
            score,
        }
    }

    fn note(score: f32) -> RankedNote {
        RankedNote {
            note: Note {
                id: Uuid::new_v4(),
                owner_id: Uuid::new_v4(),
                title: None,
                content: "note".to_string(),
                position_x: 0.0,
                position_y: 0.0,
                width: 200.0,
                height: 100.0,
                source: NoteSource::Manual,
                source_ref: None,
                parent_id: None,
                created_at_utc: Utc::now(),
                updated_at_utc: Utc::now(),
            },
            score,
        }
    }

    #[test]
    fn test_role_round_trip() {
        for (role, s) in [(Role::User, "user"), (Role::Assistant, "assistant")] {
            assert_eq!(role.to_string(), s);
            assert_eq!(s.parse::<Role>().unwrap(), role);
        }
        assert!("system".parse::<Role>().is_err());
    }

    #[test]
    fn test_note_source_round_trip() {
        let sources = [
            (NoteSource::Manual, "manual"),
            (NoteSource::Voice, "voice"),
            (NoteSource::Chat, "chat"),
            (NoteSource::AiExtracted, "ai_extracted"),
            (NoteSource::Web, "web"),
            (NoteSource::Youtube, "youtube"),
            (NoteSource::Readwise, "readwise"),
        ];
        for (source, s) in sources {
            assert_eq!(source.to_string(), s);
            assert_eq!(s.parse::<NoteSource>().unwrap(), source);
        }
        assert!("telegram".parse::<NoteSource>().is_err());
    }

    #[test]
    fn test_note_source_default() {
        assert_eq!(NoteSource::default(), NoteSource::Manual);
    }

    #[test]
    fn test_merged_is_sorted_descending() {
        let related = RelatedEntities {
            messages: vec![message(0.91), message(0.40)],
            notes: vec![note(0.85), note(0.63)],
        };

        let merged = related.merged();
        assert_eq!(merged.len(), 4);
        for pair in merged.windows(2) {
            assert!(pair[0].score() >= pair[1].score());
        }
        // Highest overall is the message, second is the note
        assert!(matches!(merged[0], RelatedHit::Message(_)));
        assert!(matches!(merged[1], RelatedHit::Note(_)));
    }

    #[test]
    fn test_merged_empty() {
        let related = RelatedEntities::default();
        assert!(related.is_empty());
        assert!(related.merged().is_empty());
    }

    #[test]
    fn test_wiki_link_resolution_target_id() {
        let id = Uuid::new_v4();
        assert_eq!(WikiLinkResolution::Existing(id).target_id(), id);
        assert_eq!(WikiLinkResolution::Created(id).target_id(), id);
    }

    #[test]
    fn test_job_type_priorities() {
        assert!(JobType::EmbedNote.default_priority() > JobType::LinkNote.default_priority());
        assert_eq!(
            JobType::EmbedMessage.default_priority(),
            JobType::EmbedNote.default_priority()
        );
    }

    #[test]
    fn test_job_type_serialization() {
        assert_eq!(
            serde_json::to_string(&JobType::EmbedNote).unwrap(),
            "\"embed_note\""
        );
        let parsed: JobType = serde_json::from_str("\"link_note\"").unwrap();
        assert_eq!(parsed, JobType::LinkNote);
    }

    #[test]
    fn test_create_note_request_new() {
        let owner = Uuid::new_v4();
        let req = CreateNoteRequest::new(owner, "hello");
        assert_eq!(req.owner_id, owner);
        assert_eq!(req.content, "hello");
        assert_eq!(req.source, NoteSource::Manual);
        assert!(req.title.is_none());
    }
}
