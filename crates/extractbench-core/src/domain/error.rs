//! Domain-level error taxonomy for extractbench.
//!
//! Errors fall into two classes. [`CollaboratorError`] covers failures of the
//! external fetch / discovery / AI collaborators; the orchestrator treats those
//! as recoverable and skips the candidate for the current case. Every other
//! [`BenchError`] variant is fatal and aborts the run.

use crate::cache::CacheError;

/// Failures reported by external collaborators.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("link discovery failed for {url}: {reason}")]
    Discovery { url: String, reason: String },

    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("extraction failed for {url}: {reason}")]
    Extraction { url: String, reason: String },

    #[error("ai provider error: {0}")]
    Provider(String),

    #[error("unsupported candidate {candidate}: {reason}")]
    UnsupportedCandidate { candidate: String, reason: String },
}

/// extractbench domain errors.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("case {case_url} already recorded for agent {agent}; reset it first")]
    DuplicateCase { agent: String, case_url: String },

    #[error("no expected answers supplied for {case_url}")]
    MissingExpected { case_url: String },

    #[error("expected answers for item {index} of {case_url} have no keys")]
    EmptyExpected { case_url: String, index: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BenchError {
    /// Whether the orchestrator may skip the current candidate and continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Collaborator(_))
    }
}

/// Result type for extractbench domain operations.
pub type Result<T> = std::result::Result<T, BenchError>;
