//! Semantic recovery selector
//!
//! Embeds a broken snippet once, scores every candidate file in a reference
//! directory against it, and returns the best match. The first failing
//! candidate aborts the whole request.

pub mod candidates;
pub mod similarity;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embedding::Embedder;
use crate::error::{CandidateFailure, RecoveryError};

pub use candidates::{scan_candidates, CandidateFile};
pub use similarity::cosine_similarity;

/// Best-matching candidate for a broken snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryResult {
    pub suggested_file: String,
    pub similarity_score: f32,
}

/// Ranks candidate files against broken code using a shared embedder
pub struct RecoveryEngine {
    embedder: Arc<dyn Embedder>,
    extension: String,
}

impl RecoveryEngine {
    pub fn new(embedder: Arc<dyn Embedder>, extension: impl Into<String>) -> Self {
        Self {
            embedder,
            extension: extension.into(),
        }
    }

    pub fn model_id(&self) -> String {
        self.embedder.model_id()
    }

    /// Suggest the file in `candidates_dir` most similar to `broken`
    pub async fn suggest_recovery(
        &self,
        broken: &str,
        candidates_dir: &Path,
    ) -> Result<RecoveryResult, RecoveryError> {
        let candidates = scan_candidates(candidates_dir, &self.extension).map_err(|source| {
            RecoveryError::RepositoryUnavailable {
                dir: candidates_dir.to_path_buf(),
                source,
            }
        })?;

        if candidates.is_empty() {
            return Err(RecoveryError::NoCandidates {
                dir: candidates_dir.to_path_buf(),
            });
        }

        debug!(
            "Scoring {} candidates in {}",
            candidates.len(),
            candidates_dir.display()
        );
        self.select(broken, &candidates).await
    }

    /// Pick the best candidate from an explicitly ordered list.
    ///
    /// Ties keep the earlier candidate.
    pub async fn select(
        &self,
        broken: &str,
        candidates: &[CandidateFile],
    ) -> Result<RecoveryResult, RecoveryError> {
        if candidates.is_empty() {
            return Err(RecoveryError::EmptyCandidateList);
        }

        let query = self.embedder.embed(broken).await?;
        debug!("Query embedding: {} dims ({})", query.dimensions(), query.model_id);
        if !similarity::has_direction(query.as_slice()) {
            return Err(RecoveryError::DegenerateEmbedding);
        }

        let mut best: Option<RecoveryResult> = None;
        for candidate in candidates {
            let score = self
                .score_candidate(query.as_slice(), candidate)
                .await
                .map_err(|source| RecoveryError::CandidateProcessing {
                    file: candidate.name.clone(),
                    source,
                })?;

            debug!("{} -> {:.4}", candidate.name, score);

            let improves = best.as_ref().map_or(true, |b| score > b.similarity_score);
            if improves {
                best = Some(RecoveryResult {
                    suggested_file: candidate.name.clone(),
                    similarity_score: score,
                });
            }
        }

        // candidates is non-empty, so best is always set here
        best.ok_or(RecoveryError::EmptyCandidateList)
    }

    async fn score_candidate(
        &self,
        query: &[f32],
        candidate: &CandidateFile,
    ) -> Result<f32, CandidateFailure> {
        let content = candidate.read()?;
        let embedding = self.embedder.embed(&content).await?;
        Ok(cosine_similarity(query, embedding.as_slice())?)
    }
}
