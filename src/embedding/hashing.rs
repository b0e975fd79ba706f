//! Offline hashing embedder
//!
//! Deterministic stand-in for a neural model. Each token is mapped to a
//! pseudo-random vector seeded by its SHA-256 digest, and the snippet
//! embedding is the mean of its token vectors. Snippets sharing many tokens
//! end up pointing in similar directions, which is enough to rank a handful
//! of candidate files without a model server.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{Embedder, Embedding};
use crate::error::EmbedError;

/// Hashing embedder with mean pooling
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
    max_tokens: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize, max_tokens: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            max_tokens,
        }
    }

    /// Embed synchronously; the trait method only wraps this
    pub fn embed_text(&self, code: &str) -> Vec<f32> {
        let tokens = tokenize(code);
        let tokens = &tokens[..tokens.len().min(self.max_tokens)];

        let mut pooled = vec![0.0f32; self.dimensions];
        if tokens.is_empty() {
            return pooled;
        }

        for token in tokens {
            for (slot, value) in pooled.iter_mut().zip(token_vector(token, self.dimensions)) {
                *slot += value;
            }
        }

        let count = tokens.len() as f32;
        for slot in &mut pooled {
            *slot /= count;
        }
        pooled
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model_id(&self) -> String {
        format!("hashing-{}", self.dimensions)
    }

    async fn embed(&self, code: &str) -> Result<Embedding, EmbedError> {
        Ok(Embedding::new(self.model_id(), self.embed_text(code)))
    }
}

/// Split code into lower-cased word pieces and single punctuation tokens.
///
/// Identifiers are split on underscores and lower-to-upper case boundaries,
/// so `add_numbers` and `addNumbers` both yield `add`, `numbers`.
pub fn tokenize(code: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    for ch in code.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            word.push(ch);
            continue;
        }
        flush_word(&mut word, &mut tokens);
        if !ch.is_whitespace() {
            tokens.push(ch.to_string());
        }
    }
    flush_word(&mut word, &mut tokens);

    tokens
}

fn flush_word(word: &mut String, tokens: &mut Vec<String>) {
    for part in word.split('_') {
        let mut piece = String::new();
        let mut prev_lower = false;
        for ch in part.chars() {
            if ch.is_uppercase() && prev_lower && !piece.is_empty() {
                tokens.push(std::mem::take(&mut piece));
            }
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
            piece.extend(ch.to_lowercase());
        }
        if !piece.is_empty() {
            tokens.push(piece);
        }
    }
    word.clear();
}

/// Deterministic vector in [-1, 1]^dimensions for one token
fn token_vector(token: &str, dimensions: usize) -> impl Iterator<Item = f32> {
    let digest = Sha256::digest(token.as_bytes());
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    let mut state = u64::from_le_bytes(seed_bytes);

    (0..dimensions).map(move |_| {
        // splitmix64
        state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
        ((z as f64 / u64::MAX as f64) * 2.0 - 1.0) as f32
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::similarity::cosine_similarity;

    #[test]
    fn test_tokenize_splits_identifiers() {
        assert_eq!(
            tokenize("def add_numbers(a, b):"),
            vec!["def", "add", "numbers", "(", "a", ",", "b", ")", ":"]
        );
        assert_eq!(tokenize("parseHttpBody"), vec!["parse", "http", "body"]);
        assert_eq!(tokenize("s[::-1]"), vec!["s", "[", ":", ":", "-", "1", "]"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("   \n\t").is_empty());
    }

    #[tokio::test]
    async fn test_same_input_same_embedding() {
        let embedder = HashingEmbedder::new(128, 512);
        let a = embedder.embed("return a + b").await.unwrap();
        let b = embedder.embed("return a + b").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.dimensions(), 128);
    }

    #[test]
    fn test_empty_input_is_zero_vector() {
        let embedder = HashingEmbedder::new(16, 512);
        assert!(embedder.embed_text("").iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_tokens_beyond_budget_are_ignored() {
        let embedder = HashingEmbedder::new(64, 3);
        let head = embedder.embed_text("def add(");
        let longer = embedder.embed_text("def add(a, b): return a + b");
        assert_eq!(head, longer);
    }

    #[test]
    fn test_shared_tokens_score_higher() {
        let embedder = HashingEmbedder::new(384, 512);
        let broken = embedder.embed_text("def add(a, b):\n  return a+b");
        let math = embedder.embed_text("def add_numbers(a, b): ... return a + b");
        let strings = embedder.embed_text("def reverse_string(s): return s[::-1]");

        let to_math = cosine_similarity(&broken, &math).unwrap();
        let to_strings = cosine_similarity(&broken, &strings).unwrap();
        assert!(to_math > to_strings);
    }
}
