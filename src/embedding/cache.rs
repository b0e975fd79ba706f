//! In-process embedding memoization

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lru::LruCache;
use sha2::{Digest, Sha256};

use super::{Embedder, Embedding};
use crate::error::EmbedError;

/// Fallback capacity when zero is configured
const DEFAULT_CAPACITY: usize = 1024;

/// Wraps an embedder and memoizes results keyed on the content hash.
///
/// At most `capacity` vectors are kept; the least recently used is evicted.
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    entries: Mutex<LruCache<String, Vec<f32>>>,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or(NonZeroUsize::new(DEFAULT_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Cache key for a snippet
    pub fn key(&self, code: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.inner.model_id().as_bytes());
        hasher.update([0u8]);
        hasher.update(code.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    fn get(&self, key: &str) -> Option<Vec<f32>> {
        self.entries.lock().ok()?.get(key).cloned()
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    fn model_id(&self) -> String {
        self.inner.model_id()
    }

    async fn embed(&self, code: &str) -> Result<Embedding, EmbedError> {
        let key = self.key(code);
        if let Some(vector) = self.get(&key) {
            tracing::debug!("Embedding cache hit {}", &key[..12]);
            return Ok(Embedding::new(self.model_id(), vector));
        }

        let embedding = self.inner.embed(code).await?;
        tracing::debug!("Embedding cache miss ({} entries)", self.len());
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(key, embedding.vector.clone());
        }
        Ok(embedding)
    }
}
