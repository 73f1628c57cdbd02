//! extractbench core library
//!
//! Benchmarks AI extraction candidates against web-scraping cases: runs every
//! (case, candidate) pair through external collaborators, caches their
//! expensive results, votes a weighted consensus per answer and keeps
//! resumable per-candidate accuracy records.

pub mod agents;
pub mod cache;
pub mod collaborators;
pub mod config;
pub mod domain;
pub mod fakes;
pub mod metrics;
pub mod obs;
pub mod orchestration;
pub mod reporting;
pub mod runner;
pub mod scoreboard;
pub mod telemetry;
pub mod vote;

pub use agents::{AgentRecord, AgentStore, ItemScore, ResetDecision};

pub use cache::fs::FsContentCache;
pub use cache::{generate_key, CacheKey, ContentCache, ContentCacheExt, Namespace};

pub use collaborators::{
    CandidateFactory, CandidateSession, CollaboratorResult, Extractor, Fetcher, LinkDiscovery,
    NullMeter, UsageMeter,
};

pub use config::BenchConfig;

pub use domain::{
    AnswerSet, BenchError, BenchmarkCase, Candidate, CandidateId, CollaboratorError, Document,
    ItemAnswers, Link, MetricSnapshot, Result, VoteWeights, NOT_FOUND,
};

pub use orchestration::{BenchPlan, Benchmark, Collaborators};
pub use reporting::{write_summary_json, RunSummary};
pub use runner::{CandidateRunner, EvaluationResult, ItemResult, ResourcePool};
pub use scoreboard::{Scoreboard, ScoreboardEntry, UsageLedger};
pub use vote::{MajorityVoter, VoteTally};

/// extractbench version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
