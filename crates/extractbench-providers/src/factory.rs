//! Builds the collaborators for a benchmark run.

use std::sync::Arc;
use std::time::Duration;

use extractbench_core::{
    Candidate, CandidateFactory, CandidateSession, CollaboratorError, CollaboratorResult,
};
use tracing::debug;

use crate::chat::{ChatClient, Pricing};
use crate::error::Result;
use crate::extractor::{ChatExtractor, Preprocess, Strategy};

/// Opens one fresh [`ChatClient`] per evaluation, so usage is metered per
/// (case, candidate).
#[derive(Debug, Clone)]
pub struct ProviderFactory {
    timeout: Duration,
}

impl ProviderFactory {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn build(&self, candidate: &Candidate) -> Result<CandidateSession> {
        let strategy: Strategy = candidate.extractor_id.parse()?;
        let preprocess = Preprocess::from_options(&candidate.options)?;
        let pricing = Pricing::from_options(&candidate.options)?;
        let client = Arc::new(ChatClient::from_env(&candidate.ai_id, pricing, self.timeout)?);
        debug!(candidate = %candidate.id(), model = %client.model(), "session opened");

        let extractor = ChatExtractor::new(Arc::clone(&client), strategy, preprocess);
        Ok(CandidateSession::new(Arc::new(extractor), client))
    }
}

impl CandidateFactory for ProviderFactory {
    fn open(&self, candidate: &Candidate) -> CollaboratorResult<CandidateSession> {
        self.build(candidate).map_err(|e| CollaboratorError::UnsupportedCandidate {
            candidate: candidate.id().to_string(),
            reason: e.to_string(),
        })
    }
}
