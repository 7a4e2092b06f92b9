//! Centralized default constants for the memex system.
//!
//! **This module is the single source of truth** for all shared default
//! values. All crates reference these constants instead of defining
//! their own magic numbers.

// =============================================================================
// EMBEDDING
// =============================================================================

/// Default embedding vector dimension (OpenAI text-embedding family).
pub const EMBED_DIMENSION: usize = 1536;

/// Default embedding model for the OpenAI backend.
pub const OPENAI_EMBED_MODEL: &str = "text-embedding-3-small";

/// Default embedding model for the Ollama backend.
pub const OLLAMA_EMBED_MODEL: &str = "nomic-embed-text";

/// Default request timeout for embedding calls, in seconds.
pub const EMBED_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// RELATEDNESS / LINKING
// =============================================================================

/// Default top-k per collection for relatedness queries.
/// Call sites may request 3 (sidebars) or 10 (full panel).
pub const RELATED_LIMIT: i64 = 5;

/// Minimum similarity for auto-created edges.
pub const AUTO_LINK_THRESHOLD: f32 = 0.70;

// =============================================================================
// WIKI-LINK SUGGESTION
// =============================================================================

/// Maximum title suggestions shown while typing a wiki-link.
pub const SUGGEST_LIMIT: i64 = 10;

/// Recommended caller-side quiet period before issuing a suggestion
/// query on keystrokes. Policy of the caller, not the engine.
pub const SUGGEST_DEBOUNCE_MS: u64 = 450;

/// Maximum wiki-link targets extracted from one note's content.
pub const WIKI_LINK_MAX_TARGETS: usize = 64;

// =============================================================================
// NOTES
// =============================================================================

/// Default canvas note width in canvas units.
pub const NOTE_WIDTH: f64 = 260.0;

/// Default canvas note height in canvas units.
pub const NOTE_HEIGHT: f64 = 140.0;

/// Default snippet/preview length in characters.
pub const SNIPPET_LENGTH: usize = 200;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for list endpoints.
pub const PAGE_LIMIT: i64 = 50;

/// Default page offset.
pub const PAGE_OFFSET: i64 = 0;

// =============================================================================
// JOBS
// =============================================================================

/// Maximum retries for failed jobs.
pub const JOB_MAX_RETRIES: i32 = 3;

/// Polling interval for the job worker when the queue is empty (ms).
pub const JOB_POLL_INTERVAL_MS: u64 = 500;

/// Maximum concurrent jobs per worker.
pub const JOB_MAX_CONCURRENT: usize = 4;

/// Per-job execution timeout in seconds.
pub const JOB_TIMEOUT_SECS: u64 = 120;

/// Capacity of the worker event broadcast channel.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;
