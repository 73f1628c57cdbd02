//! Extraction candidates and their vote weights.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// AI id of the ground-truth sentinel candidate.
pub const HUMAN: &str = "human";

/// Stable identity of a candidate, e.g. `openai:gpt-4o/iterative-prompt`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(String);

impl CandidateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_human(&self) -> bool {
        self.0 == HUMAN
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CandidateId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CandidateId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One AI model / extractor / options combination under benchmark.
///
/// `options` is an open map handed to the collaborators untouched; the
/// engine itself only reads `ai_id`, `extractor_id` and `label`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    /// Provider-qualified model id, e.g. `openai:gpt-4o` or `ollama:llama3.1:8b`.
    pub ai_id: String,

    /// Extraction strategy, e.g. `basic` or `iterative-prompt`.
    pub extractor_id: String,

    /// Free-form options (minimizer, pricing, limits, ...).
    #[serde(default)]
    pub options: BTreeMap<String, serde_json::Value>,

    /// Replaces `extractor_id` in the identity when set.
    #[serde(default)]
    pub label: Option<String>,
}

impl Candidate {
    pub fn new(ai_id: impl Into<String>, extractor_id: impl Into<String>) -> Self {
        Self {
            ai_id: ai_id.into(),
            extractor_id: extractor_id.into(),
            options: BTreeMap::new(),
            label: None,
        }
    }

    /// The ground-truth sentinel.
    pub fn human() -> Self {
        Self::new(HUMAN, HUMAN)
    }

    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_human(&self) -> bool {
        self.ai_id == HUMAN
    }

    pub fn id(&self) -> CandidateId {
        if self.is_human() {
            return CandidateId::new(HUMAN);
        }
        let suffix = self.label.as_deref().unwrap_or(&self.extractor_id);
        CandidateId::new(format!("{}/{}", self.ai_id, suffix))
    }

    /// Provider prefix of the AI id (`openai` for `openai:gpt-4o`).
    pub fn provider(&self) -> &str {
        self.ai_id.split(':').next().unwrap_or(&self.ai_id)
    }

    /// Tags stored alongside the candidate's persisted record.
    pub fn tags(&self) -> Vec<String> {
        let mut tags = vec![
            format!("ai:{}", self.ai_id),
            format!("extractor:{}", self.extractor_id),
            format!("provider:{}", self.provider()),
        ];
        if let Some(label) = &self.label {
            tags.push(format!("label:{label}"));
        }
        tags
    }
}

/// Vote weight per candidate. Unconfigured candidates weigh zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteWeights(BTreeMap<CandidateId, u32>);

impl VoteWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<CandidateId>, weight: u32) -> Self {
        self.0.insert(id.into(), weight);
        self
    }

    pub fn weight(&self, id: &CandidateId) -> u32 {
        self.0.get(id).copied().unwrap_or(0)
    }
}

impl FromIterator<(CandidateId, u32)> for VoteWeights {
    fn from_iter<I: IntoIterator<Item = (CandidateId, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_uses_extractor() {
        let c = Candidate::new("openai:gpt-4o-mini", "iterative-prompt");
        assert_eq!(c.id().as_str(), "openai:gpt-4o-mini/iterative-prompt");
    }

    #[test]
    fn test_id_prefers_label() {
        let c = Candidate::new("openai:gpt-4o", "basic").with_label("basic-minimized");
        assert_eq!(c.id().as_str(), "openai:gpt-4o/basic-minimized");
    }

    #[test]
    fn test_human_sentinel_ignores_extractor() {
        let mut c = Candidate::human();
        c.extractor_id = "iterative-prompt".to_string();
        assert_eq!(c.id().as_str(), "human");
        assert!(c.id().is_human());
    }

    #[test]
    fn test_provider_and_tags() {
        let c = Candidate::new("ollama:codellama:13b", "basic");
        assert_eq!(c.provider(), "ollama");
        assert_eq!(
            c.tags(),
            vec![
                "ai:ollama:codellama:13b".to_string(),
                "extractor:basic".to_string(),
                "provider:ollama".to_string(),
            ]
        );
    }

    #[test]
    fn test_unconfigured_weight_is_zero() {
        let weights = VoteWeights::new().with("openai:gpt-4o/basic", 2);
        assert_eq!(weights.weight(&"openai:gpt-4o/basic".into()), 2);
        assert_eq!(weights.weight(&"openai:gpt-4/basic".into()), 0);
    }

    #[test]
    fn test_candidate_options_default_on_deserialize() {
        let c: Candidate =
            serde_json::from_str(r#"{"ai_id":"openai:gpt-4o","extractor_id":"basic"}"#).unwrap();
        assert!(c.options.is_empty());
        assert!(c.label.is_none());
    }
}
