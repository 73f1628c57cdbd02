//! Run-wide accumulators: majority agreement per candidate and resource usage
//! per candidate.
//!
//! Both are plain values folded by pure functions so aggregation can be tested
//! without running a benchmark.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{AnswerSet, CandidateId, MetricSnapshot};
use crate::runner::EvaluationResult;
use crate::vote::agrees;

/// Agreement counters for one candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreboardEntry {
    /// Answer slots compared against the consensus.
    pub total: u64,
    /// Slots where the candidate's answer matched the consensus.
    pub majority: u64,
}

impl ScoreboardEntry {
    pub fn agreement_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.majority as f64 / self.total as f64
        }
    }
}

/// candidate id -> agreement counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scoreboard {
    entries: BTreeMap<CandidateId, ScoreboardEntry>,
}

impl Scoreboard {
    /// Zeroed entries for every configured candidate.
    pub fn new<'a>(candidates: impl IntoIterator<Item = &'a CandidateId>) -> Self {
        Self {
            entries: candidates
                .into_iter()
                .map(|id| (id.clone(), ScoreboardEntry::default()))
                .collect(),
        }
    }

    /// Count one (candidate, item, question) slot.
    pub fn record(&mut self, candidate: &CandidateId, actual: Option<&str>, consensus: Option<&str>) {
        let entry = self.entries.entry(candidate.clone()).or_default();
        entry.total += 1;
        if agrees(actual, consensus) {
            entry.majority += 1;
        }
    }

    /// Count every question of one item for every candidate in `order`.
    /// Candidates without answers for the item count as `(not found)`.
    pub fn record_item(
        &mut self,
        order: &[CandidateId],
        questions: &[String],
        answers: &BTreeMap<CandidateId, AnswerSet>,
        consensus: &AnswerSet,
    ) {
        for question in questions {
            for id in order {
                let actual = answers.get(id).and_then(|set| set.get(question));
                self.record(id, actual, consensus.get(question));
            }
        }
    }

    pub fn get(&self, candidate: &CandidateId) -> Option<&ScoreboardEntry> {
        self.entries.get(candidate)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CandidateId, &ScoreboardEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resource usage accumulated per candidate over a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageLedger {
    pub metrics: BTreeMap<CandidateId, MetricSnapshot>,
    /// Wall-clock seconds per candidate, summed over cases.
    pub took: BTreeMap<CandidateId, f64>,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one evaluation result into the ledger.
    pub fn fold(mut self, result: &EvaluationResult) -> Self {
        let metrics = self.metrics.entry(result.candidate.clone()).or_default();
        *metrics = metrics.add(&result.totals);
        *self.took.entry(result.candidate.clone()).or_insert(0.0) += result.wall_clock_secs;
        self
    }

    /// Usage counters per candidate.
    pub fn usage(&self) -> BTreeMap<CandidateId, BTreeMap<String, u64>> {
        self.project(|m| m.usage.clone())
    }

    /// Cost counters per candidate.
    pub fn cost(&self) -> BTreeMap<CandidateId, BTreeMap<String, f64>> {
        self.project(|m| m.cost.clone())
    }

    /// Elapsed-time counters per candidate.
    pub fn elapsed(&self) -> BTreeMap<CandidateId, BTreeMap<String, f64>> {
        self.project(|m| m.elapsed.clone())
    }

    fn project<T>(&self, f: impl Fn(&MetricSnapshot) -> T) -> BTreeMap<CandidateId, T> {
        self.metrics.iter().map(|(id, m)| (id.clone(), f(m))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NOT_FOUND;
    use crate::runner::ItemResult;

    fn id(s: &str) -> CandidateId {
        CandidateId::from(s)
    }

    #[test]
    fn test_entries_start_at_zero() {
        let ids = [id("a/basic"), id("b/basic")];
        let board = Scoreboard::new(&ids);
        assert_eq!(board.len(), 2);
        assert_eq!(board.get(&id("a/basic")), Some(&ScoreboardEntry::default()));
    }

    #[test]
    fn test_record_counts_total_unconditionally() {
        let mut board = Scoreboard::new(&[id("a")]);
        board.record(&id("a"), Some("x"), Some("x"));
        board.record(&id("a"), Some("x"), Some("y"));
        board.record(&id("a"), None, Some(NOT_FOUND));
        board.record(&id("a"), None, None);
        let e = board.get(&id("a")).unwrap();
        assert_eq!(e.total, 4);
        assert_eq!(e.majority, 2);
        assert_eq!(e.agreement_rate(), 0.5);
    }

    #[test]
    fn test_total_is_cases_times_items_times_questions() {
        let order = vec![id("a")];
        let questions = vec!["Q1".to_string(), "Q2".to_string(), "Q3".to_string()];
        let mut board = Scoreboard::new(&order);
        let consensus = AnswerSet::new().with("Q1", "x");
        let mut answers = BTreeMap::new();
        answers.insert(id("a"), AnswerSet::new().with("Q1", "x"));

        let (cases, items) = (4, 5);
        for _ in 0..cases {
            for _ in 0..items {
                board.record_item(&order, &questions, &answers, &consensus);
            }
        }
        let e = board.get(&id("a")).unwrap();
        assert_eq!(e.total, 4 * 5 * 3);
        assert_eq!(e.majority, 4 * 5);
    }

    #[test]
    fn test_missing_candidate_counts_as_not_found() {
        let order = vec![id("a"), id("skipped")];
        let questions = vec!["Q".to_string()];
        let mut board = Scoreboard::new(&order);
        let mut answers = BTreeMap::new();
        answers.insert(id("a"), AnswerSet::new());
        let consensus = AnswerSet::new().with("Q", NOT_FOUND);

        board.record_item(&order, &questions, &answers, &consensus);
        assert_eq!(board.get(&id("skipped")).unwrap().total, 1);
        assert_eq!(board.get(&id("skipped")).unwrap().majority, 1);
    }

    #[test]
    fn test_serializes_as_total_and_majority() {
        let mut board = Scoreboard::new(&[id("a")]);
        board.record(&id("a"), Some("x"), Some("x"));
        let raw = serde_json::to_value(&board).unwrap();
        assert_eq!(raw, serde_json::json!({"a": {"total": 1, "majority": 1}}));
    }

    #[test]
    fn test_usage_ledger_folds_results() {
        let result = |candidate: &str, input: u64, secs: f64| EvaluationResult {
            candidate: id(candidate),
            items: vec![ItemResult {
                url: "https://x".to_string(),
                answers: AnswerSet::new(),
                metrics: MetricSnapshot::new().with_usage("input", input),
                document: None,
            }],
            totals: MetricSnapshot::new().with_usage("input", input).with_cost("total", 0.5),
            wall_clock_secs: secs,
        };

        let ledger = [result("a", 10, 1.0), result("a", 5, 2.0), result("b", 1, 0.5)]
            .iter()
            .fold(UsageLedger::new(), UsageLedger::fold);

        assert_eq!(ledger.usage()[&id("a")]["input"], 15);
        assert_eq!(ledger.usage()[&id("b")]["input"], 1);
        assert_eq!(ledger.cost()[&id("a")]["total"], 1.0);
        assert_eq!(ledger.took[&id("a")], 3.0);
        assert!(ledger.elapsed()[&id("a")].is_empty());
    }
}
