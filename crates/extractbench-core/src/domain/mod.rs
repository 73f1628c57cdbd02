//! Domain models for extractbench.
//!
//! Canonical definitions for the core entities:
//! - `BenchmarkCase` / `Link`: what is scraped
//! - `Candidate`: who scrapes it, and how much its vote weighs
//! - `AnswerSet` / `Document`: what goes in and comes out of an extraction
//! - `MetricSnapshot`: what it cost

pub mod answers;
pub mod candidate;
pub mod case;
pub mod error;
pub mod usage;

// Re-export main types and errors
pub use answers::{AnswerSet, Document, ItemAnswers, NOT_FOUND};
pub use candidate::{Candidate, CandidateId, VoteWeights, HUMAN};
pub use case::{BenchmarkCase, Link};
pub use error::{BenchError, CollaboratorError, Result};
pub use usage::MetricSnapshot;
