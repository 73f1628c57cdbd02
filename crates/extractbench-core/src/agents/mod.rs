//! Durable, resumable per-candidate accuracy records.
//!
//! Every candidate owns one JSON record holding its per-case item scores,
//! per-case usage and an overall tally. Records survive across runs; the
//! guards in [`guard`] make sure a case is never recorded twice and that a
//! smaller run never replaces a larger one.

pub mod guard;
pub mod record;
pub mod store;

pub use guard::{case_state, check_record, plan_reset, CaseState, ResetDecision};
pub use record::{AgentRecord, ItemScore, Overall};
pub use store::{record_filename, AgentStore, MANIFEST_FILE};
