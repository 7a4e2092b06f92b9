//! Backend selection from configuration.

use std::sync::Arc;

use memex_core::{defaults, EmbeddingBackend, Error, Result};

use crate::{MockEmbeddingBackend, OllamaBackend, OpenAiBackend};

/// Which embedding provider to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmbeddingProviderKind {
    /// Local Ollama instance (default)
    #[default]
    Ollama,
    /// OpenAI API
    OpenAi,
    /// Deterministic in-process mock (tests, offline development)
    Mock,
}

impl std::str::FromStr for EmbeddingProviderKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Invalid embedding provider: {}", s)),
        }
    }
}

/// Inference configuration resolved from the environment.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub provider: EmbeddingProviderKind,
    pub dimension: usize,
}

impl InferenceConfig {
    /// Read `MEMEX_EMBED_PROVIDER` (default `ollama`) and
    /// `MEMEX_EMBED_DIMENSION` (default 1536).
    pub fn from_env() -> Result<Self> {
        let provider = match std::env::var("MEMEX_EMBED_PROVIDER") {
            Ok(value) => value
                .parse()
                .map_err(Error::Config)?,
            Err(_) => EmbeddingProviderKind::default(),
        };
        let dimension = std::env::var("MEMEX_EMBED_DIMENSION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::EMBED_DIMENSION);

        Ok(Self {
            provider,
            dimension,
        })
    }

    /// Construct the configured backend.
    pub fn create_backend(&self) -> Result<Arc<dyn EmbeddingBackend>> {
        Ok(match self.provider {
            EmbeddingProviderKind::Ollama => Arc::new(OllamaBackend::from_env()),
            EmbeddingProviderKind::OpenAi => Arc::new(OpenAiBackend::from_env()?),
            EmbeddingProviderKind::Mock => Arc::new(MockEmbeddingBackend::new(self.dimension)),
        })
    }
}
