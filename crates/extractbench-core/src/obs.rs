//! Structured observability hooks for benchmark lifecycle events.
//!
//! This module provides:
//! - Case-scoped tracing spans via the `CaseSpan` RAII guard
//! - Emission functions for the key lifecycle events of a run
//!
//! Events are emitted at `info!` level unless noted (filter with `RUST_LOG`).
//! For JSON output, pass `--json` to the binary.

use tracing::{info, warn};

/// RAII guard that enters a case-scoped tracing span while a case runs.
///
/// ```ignore
/// let _span = CaseSpan::enter("https://example.com/jobs", 1, 3);
/// // every event below carries case_url, case_index and case_total
/// ```
pub struct CaseSpan {
    _span: tracing::span::EnteredSpan,
}

impl CaseSpan {
    pub fn enter(case_url: &str, index: usize, total: usize) -> Self {
        let span = tracing::info_span!(
            "bench.case",
            case_url = %case_url,
            case_index = index,
            case_total = total,
        );
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: a case started with this many candidates.
pub fn emit_case_started(case_url: &str, candidates: usize) {
    info!(event = "bench.case_started", case_url = %case_url, candidates = candidates);
}

/// Emit event: a candidate finished a case.
pub fn emit_candidate_finished(candidate: &str, items: usize, wall_clock_secs: f64) {
    info!(
        event = "bench.candidate_finished",
        candidate = %candidate,
        items = items,
        wall_clock_secs = wall_clock_secs,
    );
}

/// Emit event: a candidate was skipped for the current case (warning level).
pub fn emit_candidate_skipped(candidate: &str, error: &dyn std::fmt::Display) {
    warn!(event = "bench.candidate_skipped", candidate = %candidate, error = %error);
}

/// Emit event: consensus computed for one item.
pub fn emit_majority_computed(item_url: &str, questions: usize, answered: usize) {
    info!(
        event = "bench.majority_computed",
        item_url = %item_url,
        questions = questions,
        answered = answered,
    );
}

/// Emit event: a reset was refused because a larger run is already stored.
pub fn emit_reset_protected(candidate: &str, case_url: &str, stored: usize, limit: usize) {
    warn!(
        event = "agents.reset_protected",
        candidate = %candidate,
        case_url = %case_url,
        stored = stored,
        limit = limit,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_span_create() {
        let _span = CaseSpan::enter("https://example.com", 1, 2);
        emit_case_started("https://example.com", 3);
        emit_candidate_skipped("a/basic", &"boom");
        emit_reset_protected("a/basic", "https://example.com", 10, 5);
    }
}
