//! OpenAI embedding backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use memex_core::{defaults, EmbeddingBackend, Error, Result, Vector};

/// Default OpenAI API base URL.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Embedding backend for the OpenAI embeddings API (and compatible
/// servers; override the base URL to point elsewhere).
pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiBackend {
    /// Create a backend with an explicit key, model, and dimension.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            dimension,
            timeout_secs: defaults::EMBED_TIMEOUT_SECS,
        }
    }

    /// Create a backend from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `OPENAI_API_KEY` | (required) |
    /// | `OPENAI_BASE_URL` | `https://api.openai.com/v1` |
    /// | `OPENAI_EMBED_MODEL` | `text-embedding-3-small` |
    /// | `MEMEX_EMBED_DIMENSION` | `1536` |
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::Config("OPENAI_API_KEY is not set".to_string()))?;
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_OPENAI_URL.to_string());
        let model = std::env::var("OPENAI_EMBED_MODEL")
            .unwrap_or_else(|_| defaults::OPENAI_EMBED_MODEL.to_string());
        let dimension = std::env::var("MEMEX_EMBED_DIMENSION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::EMBED_DIMENSION);
        Ok(Self::new(base_url, api_key, model, dimension))
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAiBackend {
    #[instrument(
        skip(self, texts),
        fields(subsystem = "inference", component = "openai", op = "embed_texts",
               model = %self.model, input_count = texts.len())
    )]
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let start = Instant::now();

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "OpenAI returned {}: {}",
                status, body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse response: {}", e)))?;

        // Responses are index-tagged; don't assume they arrive in order.
        let mut data = result.data;
        data.sort_by_key(|d| d.index);
        let vectors: Vec<Vector> = data.into_iter().map(|d| Vector::from(d.embedding)).collect();

        if vectors.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }

        debug!(
            result_count = vectors.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Embedding complete"
        );
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        Ok(matches!(response, Ok(r) if r.status().is_success()))
    }
}
