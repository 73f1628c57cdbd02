//! Transition guards for per-(candidate, case) record state.
//!
//! ```text
//!            reset (stored <= limit)
//!   Absent <------------------------- Recorded
//!     |                                  ^
//!     +----------- record ---------------+
//! ```
//!
//! `Recorded` is terminal while its stored item count exceeds the reset
//! limit: a smaller run must never overwrite a larger prior one.

use crate::domain::{AnswerSet, BenchError, Result};

use super::record::AgentRecord;

/// Where a case stands in a candidate's record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseState {
    Absent,
    Recorded { items: usize },
}

pub fn case_state(record: &AgentRecord, case_url: &str) -> CaseState {
    if record.processed.contains(case_url) || record.scoring.contains_key(case_url) {
        CaseState::Recorded {
            items: record.stored_items(case_url),
        }
    } else {
        CaseState::Absent
    }
}

/// Outcome of a reset request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetDecision {
    /// Remove the case so it can be recorded again.
    Clear,
    /// A larger prior run is stored; leave the record untouched.
    Protected { stored: usize, limit: usize },
}

impl ResetDecision {
    pub fn is_protected(self) -> bool {
        matches!(self, Self::Protected { .. })
    }
}

pub fn plan_reset(record: &AgentRecord, case_url: &str, item_limit: usize) -> ResetDecision {
    match case_state(record, case_url) {
        CaseState::Recorded { items } if items > item_limit => ResetDecision::Protected {
            stored: items,
            limit: item_limit,
        },
        _ => ResetDecision::Clear,
    }
}

/// Check that a result may be recorded for `case_url`. Runs before any
/// mutation of the record.
pub fn check_record(record: &AgentRecord, case_url: &str, expected: &[AnswerSet]) -> Result<()> {
    if expected.is_empty() {
        return Err(BenchError::MissingExpected {
            case_url: case_url.to_string(),
        });
    }
    if let Some(index) = expected.iter().position(AnswerSet::is_empty) {
        return Err(BenchError::EmptyExpected {
            case_url: case_url.to_string(),
            index,
        });
    }
    if record.processed.contains(case_url) {
        return Err(BenchError::DuplicateCase {
            agent: record.id.to_string(),
            case_url: case_url.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::record::ItemScore;
    use crate::domain::MetricSnapshot;

    fn record_with(case_url: &str, items: usize) -> AgentRecord {
        let mut record = AgentRecord::new("a/basic".into());
        let expected = AnswerSet::new().with("Q", "x");
        let scores = (0..items)
            .map(|i| ItemScore::compute(format!("{i}"), MetricSnapshot::default(), &expected, &expected))
            .collect();
        record.processed.insert(case_url.to_string());
        record.scoring.insert(case_url.to_string(), scores);
        record
    }

    #[test]
    fn test_case_state() {
        let record = record_with("https://case", 3);
        assert_eq!(case_state(&record, "https://case"), CaseState::Recorded { items: 3 });
        assert_eq!(case_state(&record, "https://other"), CaseState::Absent);
    }

    #[test]
    fn test_reset_protects_larger_prior_run() {
        let record = record_with("https://case", 11);
        assert_eq!(
            plan_reset(&record, "https://case", 10),
            ResetDecision::Protected { stored: 11, limit: 10 }
        );
    }

    #[test]
    fn test_reset_clears_equal_or_smaller_run() {
        let record = record_with("https://case", 10);
        assert_eq!(plan_reset(&record, "https://case", 10), ResetDecision::Clear);
        assert_eq!(plan_reset(&record, "https://absent", 0), ResetDecision::Clear);
    }

    #[test]
    fn test_check_rejects_empty_expected() {
        let record = AgentRecord::new("a".into());
        assert!(matches!(
            check_record(&record, "u", &[]),
            Err(BenchError::MissingExpected { .. })
        ));
    }

    #[test]
    fn test_check_rejects_keyless_expected() {
        let record = AgentRecord::new("a".into());
        let expected = vec![AnswerSet::new().with("Q", "x"), AnswerSet::new()];
        match check_record(&record, "u", &expected) {
            Err(BenchError::EmptyExpected { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected EmptyExpected, got {other:?}"),
        }
    }

    #[test]
    fn test_check_rejects_duplicate_case() {
        let record = record_with("https://case", 1);
        let expected = vec![AnswerSet::new().with("Q", "x")];
        assert!(matches!(
            check_record(&record, "https://case", &expected),
            Err(BenchError::DuplicateCase { .. })
        ));
        assert!(check_record(&record, "https://other", &expected).is_ok());
    }
}
