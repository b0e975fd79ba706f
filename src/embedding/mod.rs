//! Embedding backends
//!
//! Every backend maps a code snippet to a fixed-length vector. The backend is
//! built once at startup and shared read-only between requests.

pub mod cache;
pub mod hashing;
pub mod ollama;

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::config::EmbeddingConfig;
use crate::error::EmbedError;

pub use cache::CachedEmbedder;
pub use hashing::HashingEmbedder;
pub use ollama::OllamaEmbedder;

/// Rough characters-per-token ratio used when only characters can be counted
pub const CHARS_PER_TOKEN: usize = 4;

/// A dense embedding vector together with the model that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub model_id: String,
    pub vector: Vec<f32>,
}

impl Embedding {
    pub fn new(model_id: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            model_id: model_id.into(),
            vector,
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.vector
    }

    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }
}

/// Interface for anything that turns code into an embedding
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier of the model/configuration; embeddings are only comparable
    /// when their model ids match
    fn model_id(&self) -> String;

    /// Embed a code snippet
    async fn embed(&self, code: &str) -> Result<Embedding, EmbedError>;
}

/// Keep the leading `max_chars` characters of `code`
pub fn truncate_chars(code: &str, max_chars: usize) -> &str {
    match code.char_indices().nth(max_chars) {
        Some((idx, _)) => &code[..idx],
        None => code,
    }
}

/// Build the backend named in the configuration
pub fn from_config(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match config.backend.as_str() {
        "ollama" => Arc::new(OllamaEmbedder::from_config(config)?),
        "hashing" => Arc::new(HashingEmbedder::new(config.dimensions, config.max_tokens)),
        other => bail!("Unknown embedding backend: {}", other),
    };

    if config.cache {
        Ok(Arc::new(CachedEmbedder::new(embedder, config.cache_size)))
    } else {
        Ok(embedder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_truncate_keeps_leading_portion() {
        assert_eq!(truncate_chars("def add(a, b)", 3), "def");
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }

    #[test]
    fn test_from_config_rejects_unknown_backend() {
        let mut config = Config::default().embedding;
        config.backend = "word2vec".to_string();
        assert!(from_config(&config).is_err());
    }

    #[test]
    fn test_from_config_builds_hashing_backend() {
        let mut config = Config::default().embedding;
        config.backend = "hashing".to_string();
        config.dimensions = 64;
        let embedder = from_config(&config).unwrap();
        assert_eq!(embedder.model_id(), "hashing-64");
    }
}
