//! Durable per-candidate accuracy records.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AnswerSet, CandidateId, MetricSnapshot};

/// Score of one item page against its expected answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemScore {
    pub url: String,
    pub metrics: MetricSnapshot,
    pub expected: AnswerSet,
    pub actual: AnswerSet,
    pub correct: u64,
    pub total: u64,
    /// Expected questions the candidate got wrong, sorted by question text.
    pub wrong: Vec<String>,
}

impl ItemScore {
    /// Compare `actual` with `expected` by exact string equality, one slot per
    /// expected question.
    pub fn compute(url: impl Into<String>, metrics: MetricSnapshot, expected: &AnswerSet, actual: &AnswerSet) -> Self {
        let mut correct = 0;
        let mut total = 0;
        let mut wrong = Vec::new();
        for (question, want) in expected.iter() {
            total += 1;
            if actual.get(question) == Some(want) {
                correct += 1;
            } else {
                wrong.push(question.to_string());
            }
        }
        Self {
            url: url.into(),
            metrics,
            expected: expected.clone(),
            actual: actual.clone(),
            correct,
            total,
            wrong,
        }
    }
}

/// Aggregate over every stored case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overall {
    pub total: u64,
    pub correct: u64,
}

/// Everything known about one candidate's accuracy across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: CandidateId,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Case URLs with a recorded result. Never contains duplicates.
    #[serde(default)]
    pub processed: BTreeSet<String>,
    #[serde(default)]
    pub scoring: BTreeMap<String, Vec<ItemScore>>,
    #[serde(default)]
    pub metrics: BTreeMap<String, MetricSnapshot>,
    #[serde(default)]
    pub overall: Overall,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AgentRecord {
    pub fn new(id: CandidateId) -> Self {
        Self {
            id,
            tags: Vec::new(),
            processed: BTreeSet::new(),
            scoring: BTreeMap::new(),
            metrics: BTreeMap::new(),
            overall: Overall::default(),
            updated_at: None,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Number of items stored for `case_url` (0 when absent).
    pub fn stored_items(&self, case_url: &str) -> usize {
        self.scoring.get(case_url).map_or(0, Vec::len)
    }

    /// Sum of every stored item score.
    pub fn compute_overall(&self) -> Overall {
        self.scoring
            .values()
            .flatten()
            .fold(Overall::default(), |acc, score| Overall {
                total: acc.total + score.total,
                correct: acc.correct + score.correct,
            })
    }

    pub fn accuracy(&self) -> f64 {
        if self.overall.total == 0 {
            0.0
        } else {
            self.overall.correct as f64 / self.overall.total as f64
        }
    }
}
