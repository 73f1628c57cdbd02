//! Lifecycle events and spans emit without a subscriber and under one.

use extractbench_core::obs::{
    emit_candidate_finished, emit_candidate_skipped, emit_case_started, emit_majority_computed,
    emit_reset_protected, CaseSpan,
};
use extractbench_core::telemetry::init_tracing;
use extractbench_core::CollaboratorError;

#[test]
fn events_emit_inside_case_span() {
    init_tracing(false, tracing::Level::DEBUG);
    let span = CaseSpan::enter("https://seed.example", 1, 2);
    emit_case_started("https://seed.example", 3);
    emit_candidate_finished("openai:gpt-4o/basic", 10, 12.5);
    emit_majority_computed("https://seed.example/1", 4, 3);
    drop(span);
}

#[test]
fn skip_event_accepts_collaborator_errors() {
    let err = CollaboratorError::Fetch {
        url: "https://seed.example/1".to_string(),
        reason: "connection reset".to_string(),
    };
    emit_candidate_skipped("openai:gpt-4o/basic", &err);
    emit_reset_protected("openai:gpt-4o/basic", "https://seed.example", 10, 5);
}
