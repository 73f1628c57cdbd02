//! Weighted majority voting over candidate answers.
//!
//! For every (item, question) pair the answers of all weighted candidates are
//! tallied and the heaviest answer becomes the consensus. The consensus is the
//! reference every candidate is scored against when no ground truth exists.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::{CacheKey, ContentCache, ContentCacheExt, Namespace};
use crate::domain::{AnswerSet, CandidateId, ItemAnswers, VoteWeights, NOT_FOUND};

/// Answer -> accumulated weight for one (item, question), in the order the
/// answers were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    entries: Vec<(String, u64)>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, answer: &str, weight: u32) {
        match self.entries.iter_mut().find(|(a, _)| a == answer) {
            Some((_, total)) => *total += u64::from(weight),
            None => self.entries.push((answer.to_string(), u64::from(weight))),
        }
    }

    pub fn weight_of(&self, answer: &str) -> u64 {
        self.entries
            .iter()
            .find(|(a, _)| a == answer)
            .map_or(0, |(_, w)| *w)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The answer whose weight is strictly greater than every answer seen
    /// before it. Ties go to the earliest answer; an empty tally has no winner.
    pub fn winner(&self) -> Option<&str> {
        let mut best: Option<(&str, u64)> = None;
        for (answer, weight) in &self.entries {
            if *weight > best.map_or(0, |(_, w)| w) {
                best = Some((answer.as_str(), *weight));
            }
        }
        best.map(|(answer, _)| answer)
    }
}

/// Computes consensus answers with a fixed candidate scan order.
#[derive(Debug, Clone)]
pub struct MajorityVoter {
    order: Vec<CandidateId>,
    weights: VoteWeights,
}

impl MajorityVoter {
    /// `order` is the tie-break authority and must be the configured order,
    /// never the order in which candidates happened to finish.
    pub fn new(order: Vec<CandidateId>, weights: VoteWeights) -> Self {
        Self { order, weights }
    }

    pub fn order(&self) -> &[CandidateId] {
        &self.order
    }

    /// Tally one question. Candidates without a weight do not vote; weighted
    /// candidates without answers for this item vote `(not found)`.
    pub fn tally(&self, question: &str, answers: &BTreeMap<CandidateId, AnswerSet>) -> VoteTally {
        let mut tally = VoteTally::new();
        for id in &self.order {
            let weight = self.weights.weight(id);
            if weight == 0 {
                continue;
            }
            let answer = answers.get(id).map_or(NOT_FOUND, |set| set.answer_or_not_found(question));
            tally.add(answer, weight);
        }
        tally
    }

    /// Consensus answers for one item. Questions nobody voted on are omitted.
    pub fn compute(&self, questions: &[String], answers: &BTreeMap<CandidateId, AnswerSet>) -> AnswerSet {
        let mut majority = AnswerSet::new();
        for question in questions {
            let tally = self.tally(question, answers);
            if let Some(winner) = tally.winner() {
                majority.insert(question.clone(), winner);
            } else {
                debug!(question = %question, "no weighted votes; question omitted");
            }
        }
        majority
    }
}

/// Persist a consensus under the `majority` namespace.
pub fn save_majority(
    cache: &dyn ContentCache,
    item_url: &str,
    joined_questions: &str,
    majority: &AnswerSet,
) -> crate::cache::Result<()> {
    let record = ItemAnswers {
        url: item_url.to_string(),
        data: majority.clone(),
    };
    cache.save(Namespace::Majority, &CacheKey::answers(item_url, joined_questions), &record)
}

/// Read back a persisted consensus.
pub fn load_majority(
    cache: &dyn ContentCache,
    item_url: &str,
    joined_questions: &str,
) -> crate::cache::Result<Option<ItemAnswers>> {
    cache.load(Namespace::Majority, &CacheKey::answers(item_url, joined_questions))
}

/// Whether `answer` agrees with the consensus for a question.
pub fn agrees(answer: Option<&str>, consensus: Option<&str>) -> bool {
    Some(answer.unwrap_or(NOT_FOUND)) == consensus
}
