//! # memex-inference
//!
//! Embedding provider backends for memex.
//!
//! Two HTTP backends ([`OllamaBackend`], [`OpenAiBackend`]) and a
//! deterministic [`MockEmbeddingBackend`] for tests, all behind the
//! [`memex_core::EmbeddingBackend`] trait. Backends never retry on
//! their own; failures surface as `Error::Embedding` and retry policy
//! stays with the caller.

pub mod config;
pub mod mock;
pub mod ollama;
pub mod openai;

pub use config::{EmbeddingProviderKind, InferenceConfig};
pub use mock::MockEmbeddingBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;
