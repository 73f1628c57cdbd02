//! Collaborator trait definitions for extractbench
//!
//! The engine never fetches, crawls or prompts anything itself. These traits
//! define the external collaborators it calls into:
//! - `LinkDiscovery`: find target links on a seed page
//! - `Fetcher`: download a page into a `Document`
//! - `Extractor`: answer questions about a `Document`
//! - `UsageMeter`: expose cumulative AI usage counters
//! - `CandidateFactory`: build an extractor + meter pair for a candidate
//!
//! All I/O traits are async and backend-agnostic. In-memory fakes are
//! provided for testing via the `fakes` module.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{AnswerSet, Candidate, CollaboratorError, Document, Link, MetricSnapshot};

/// Result type for collaborator calls
pub type CollaboratorResult<T> = std::result::Result<T, CollaboratorError>;

/// Finds target links on a seed page.
///
/// Guarantees: the returned links are deduplicated, ordered, and at most
/// `limit` long.
#[async_trait]
pub trait LinkDiscovery: Send + Sync {
    async fn discover(&self, seed_url: &str, prompt: &str, limit: usize) -> CollaboratorResult<Vec<Link>>;
}

/// Downloads and parses a page.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> CollaboratorResult<Document>;
}

/// Answers an ordered list of questions about one document.
///
/// Questions it cannot answer may be omitted from the returned set;
/// `Ok(None)` means nothing could be extracted at all.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, document: &Document, questions: &[String]) -> CollaboratorResult<Option<AnswerSet>>;
}

/// Cumulative usage counters of an AI session.
///
/// Contract: every counter is monotonically non-decreasing over the
/// session's lifetime, and reading a snapshot has no side effects.
pub trait UsageMeter: Send + Sync {
    fn snapshot(&self) -> MetricSnapshot;
}

/// An extractor and the meter of the AI session backing it.
#[derive(Clone)]
pub struct CandidateSession {
    pub extractor: Arc<dyn Extractor>,
    pub meter: Arc<dyn UsageMeter>,
}

impl CandidateSession {
    pub fn new(extractor: Arc<dyn Extractor>, meter: Arc<dyn UsageMeter>) -> Self {
        Self { extractor, meter }
    }
}

/// Builds a fresh session for each (case, candidate) evaluation.
pub trait CandidateFactory: Send + Sync {
    fn open(&self, candidate: &Candidate) -> CollaboratorResult<CandidateSession>;
}

/// A meter that never moves, for sessions without an AI behind them.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMeter;

impl UsageMeter for NullMeter {
    fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot::default()
    }
}
