//! # memex-jobs
//!
//! Background job queue system for memex.
//!
//! Content mutation and embedding refresh are deliberately decoupled:
//! an edit returns immediately and enqueues a deduplicated job row,
//! which this crate's worker later claims, executes, and retries on
//! failure (at-least-once, bounded by `max_retries`). Failures are
//! observable via job status rather than lost.
//!
//! ## Example
//!
//! ```ignore
//! use memex_jobs::{EmbedNoteHandler, JobWorker, WorkerConfig};
//! use memex_db::Database;
//!
//! let db = Database::connect("postgres://...").await?;
//! let worker = JobWorker::new(db.clone(), WorkerConfig::from_env());
//! worker.register_handler(EmbedNoteHandler::new(db, embedder)).await;
//! let handle = worker.start();
//! // ...
//! handle.shutdown().await?;
//! ```

pub mod embedding_handler;
pub mod handler;
pub mod linking_handler;
pub mod worker;

// Re-export core types
pub use memex_core::*;

pub use embedding_handler::{EmbedMessageHandler, EmbedNoteHandler};
pub use handler::{JobContext, JobHandler, JobResult, NoOpHandler};
pub use linking_handler::LinkNoteHandler;
pub use worker::{JobWorker, WorkerConfig, WorkerEvent, WorkerHandle};

/// Default maximum retries for failed jobs.
pub const DEFAULT_MAX_RETRIES: i32 = memex_core::defaults::JOB_MAX_RETRIES;

/// Default polling interval for job processing (milliseconds).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = memex_core::defaults::JOB_POLL_INTERVAL_MS;
