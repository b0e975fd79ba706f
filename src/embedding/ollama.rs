//! Ollama embedding backend
//!
//! Runs a pretrained embedding model locally via Ollama.
//! No API key needed - runs completely offline.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{truncate_chars, Embedder, Embedding, CHARS_PER_TOKEN};
use crate::config::EmbeddingConfig;
use crate::error::EmbedError;

/// Default Ollama server URL
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default embedding model
const DEFAULT_MODEL: &str = "nomic-embed-text";

/// Request for the embed endpoint
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
    truncate: bool,
}

/// Embed response
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}

/// List models response
#[derive(Debug, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
}

/// Model information
#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub name: String,
}

/// Embedding client for a local Ollama server
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    max_tokens: usize,
    client: reqwest::Client,
}

impl OllamaEmbedder {
    /// Create a client against `base_url` using `model`
    pub fn new(base_url: &str, model: &str, max_tokens: usize, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            max_tokens,
            client,
        })
    }

    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let endpoint = if config.endpoint.is_empty() {
            DEFAULT_OLLAMA_URL
        } else {
            config.endpoint.as_str()
        };
        let model = if config.model.is_empty() {
            DEFAULT_MODEL
        } else {
            config.model.as_str()
        };
        Self::new(
            endpoint,
            model,
            config.max_tokens,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Check if Ollama is running
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        self.client.get(&url).send().await.is_ok()
    }

    /// List models installed on the server
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to connect to Ollama. Is it running?")?;

        if !response.status().is_success() {
            anyhow::bail!("Ollama request failed: {}", response.status());
        }

        let models: ModelsResponse = response
            .json()
            .await
            .context("Failed to parse models response")?;

        Ok(models.models)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn unavailable(&self, reason: impl Into<String>) -> EmbedError {
        EmbedError::ModelUnavailable {
            model: self.model.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_id(&self) -> String {
        format!("ollama:{}", self.model)
    }

    async fn embed(&self, code: &str) -> Result<Embedding, EmbedError> {
        let url = format!("{}/api/embed", self.base_url);
        let input = truncate_chars(code, self.max_tokens.saturating_mul(CHARS_PER_TOKEN));

        let request = EmbedRequest {
            model: &self.model,
            input,
            truncate: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.unavailable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(self.unavailable(format!("Ollama returned {}: {}", status, body.trim())));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbedError::InvalidResponse(format!("failed to parse response: {}", e)))?;

        let vector = body
            .embeddings
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| EmbedError::InvalidResponse("response contained no embeddings".to_string()))?;

        Ok(Embedding::new(self.model_id(), vector))
    }
}
