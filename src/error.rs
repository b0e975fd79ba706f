//! Error types for embedding, scoring and recovery

use std::path::PathBuf;
use thiserror::Error;

/// Failure of an embedding backend
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding model `{model}` is unavailable: {reason}")]
    ModelUnavailable { model: String, reason: String },

    #[error("embedding backend returned no usable vector: {0}")]
    InvalidResponse(String),
}

/// Failure of the cosine similarity scorer
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimilarityError {
    #[error("cosine similarity is undefined for a zero-norm or non-finite embedding")]
    DegenerateEmbedding,

    #[error("embedding dimensions differ: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

/// Why a single candidate file could not be scored
#[derive(Debug, Error)]
pub enum CandidateFailure {
    #[error("could not read file: {0}")]
    Read(#[from] std::io::Error),

    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error(transparent)]
    Score(#[from] SimilarityError),
}

/// Failure of a whole recovery request
#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("embedding model `{model}` is unavailable: {reason}")]
    ModelUnavailable { model: String, reason: String },

    #[error("embedding backend returned no usable vector: {0}")]
    InvalidEmbedding(String),

    #[error("the broken snippet produced a zero-norm embedding")]
    DegenerateEmbedding,

    #[error("embedding dimensions differ: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("no candidate files found in {}", dir.display())]
    NoCandidates { dir: PathBuf },

    #[error("no candidate files to compare against")]
    EmptyCandidateList,

    #[error("failed to process candidate `{file}`: {source}")]
    CandidateProcessing {
        file: String,
        #[source]
        source: CandidateFailure,
    },

    #[error("cannot read repository {}: {source}", dir.display())]
    RepositoryUnavailable {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<EmbedError> for RecoveryError {
    fn from(err: EmbedError) -> Self {
        match err {
            EmbedError::ModelUnavailable { model, reason } => {
                RecoveryError::ModelUnavailable { model, reason }
            }
            EmbedError::InvalidResponse(reason) => RecoveryError::InvalidEmbedding(reason),
        }
    }
}

impl From<SimilarityError> for RecoveryError {
    fn from(err: SimilarityError) -> Self {
        match err {
            SimilarityError::DegenerateEmbedding => RecoveryError::DegenerateEmbedding,
            SimilarityError::DimensionMismatch { left, right } => {
                RecoveryError::DimensionMismatch { left, right }
            }
        }
    }
}
