//! Mock embedding backend for deterministic testing.
//!
//! Generates a stable pseudo-random unit vector per distinct input
//! text, so identical text always embeds identically and different
//! texts land far apart — no network, no model.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use memex_core::{EmbeddingBackend, Error, Result, Vector};

/// Deterministic in-process embedding backend.
pub struct MockEmbeddingBackend {
    dimension: usize,
    fixed: Mutex<HashMap<String, Vec<f32>>>,
    fail_with: Option<String>,
    call_log: Mutex<Vec<String>>,
}

impl MockEmbeddingBackend {
    /// Create a mock with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fixed: Mutex::new(HashMap::new()),
            fail_with: None,
            call_log: Mutex::new(Vec::new()),
        }
    }

    /// Pin an exact vector for a specific input text.
    pub fn with_vector_for(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.fixed.lock().unwrap().insert(text.into(), vector);
        self
    }

    /// Make every call fail with the given message.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    /// Number of embed calls made so far.
    pub fn embed_call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }

    /// All texts embedded so far, in call order.
    pub fn embedded_texts(&self) -> Vec<String> {
        self.call_log.lock().unwrap().clone()
    }

    /// Deterministic normalized vector seeded from the text bytes.
    fn generate(&self, text: &str) -> Vec<f32> {
        let seed = text
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325u64, |acc, b| {
                (acc ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
            });

        let mut vec = vec![0.0f32; self.dimension];
        let mut state = seed;
        for val in vec.iter_mut() {
            // LCG: cheap, stable across platforms
            state = state.wrapping_mul(1664525).wrapping_add(1013904223);
            *val = ((state % 1000) as f32) / 1000.0 - 0.5;
        }

        let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            vec.iter_mut().for_each(|x| *x /= magnitude);
        }
        vec
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if let Some(message) = &self.fail_with {
            return Err(Error::Embedding(message.clone()));
        }

        let mut log = self.call_log.lock().unwrap();
        let fixed = self.fixed.lock().unwrap();

        Ok(texts
            .iter()
            .map(|text| {
                log.push(text.clone());
                fixed
                    .get(text)
                    .cloned()
                    .unwrap_or_else(|| self.generate(text))
                    .into()
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.fail_with.is_none())
    }
}
