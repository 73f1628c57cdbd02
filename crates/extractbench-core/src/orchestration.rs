//! Benchmark orchestration.
//!
//! Runs the cartesian product {case x candidate}:
//! - evaluates every candidate of a case (sequentially or concurrently)
//! - skips a candidate for the current case on collaborator failure
//! - records results against ground truth when it exists
//! - after the barrier, votes a consensus per item and scores everyone
//!   against it
//!
//! Any non-collaborator error aborts the run.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::agents::{record_filename, AgentStore, ResetDecision};
use crate::cache::ContentCache;
use crate::collaborators::{CandidateFactory, Fetcher, LinkDiscovery};
use crate::config::BenchConfig;
use crate::domain::{AnswerSet, BenchError, BenchmarkCase, Candidate, CandidateId, Result, VoteWeights};
use crate::metrics::METRICS;
use crate::obs::{self, CaseSpan};
use crate::reporting::RunSummary;
use crate::runner::{preview, CandidateRunner, EvaluationResult, ResourcePool};
use crate::scoreboard::{Scoreboard, UsageLedger};
use crate::vote::{save_majority, MajorityVoter};

/// What to benchmark: cases, candidates in tie-break order, and vote weights.
#[derive(Debug, Clone, Default)]
pub struct BenchPlan {
    pub cases: Vec<BenchmarkCase>,
    pub candidates: Vec<Candidate>,
    pub weights: VoteWeights,
}

impl BenchPlan {
    pub fn new(cases: Vec<BenchmarkCase>, candidates: Vec<Candidate>, weights: VoteWeights) -> Self {
        Self {
            cases,
            candidates,
            weights,
        }
    }

    /// Candidate ids in configured order.
    pub fn order(&self) -> Vec<CandidateId> {
        self.candidates.iter().map(Candidate::id).collect()
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        let mut files = BTreeMap::new();
        for id in self.order() {
            if !seen.insert(id.clone()) {
                return Err(BenchError::InvalidConfig(format!("duplicate candidate `{id}`")));
            }
            if let Some(other) = files.insert(record_filename(&id), id.clone()) {
                return Err(BenchError::InvalidConfig(format!(
                    "candidates `{other}` and `{id}` share the record file {}",
                    record_filename(&id)
                )));
            }
        }
        if let Some(case) = self.cases.iter().find(|c| c.questions.is_empty()) {
            return Err(BenchError::InvalidConfig(format!(
                "case {} has no questions",
                case.seed_url
            )));
        }
        Ok(())
    }
}

/// The external collaborators a benchmark runs against.
#[derive(Clone)]
pub struct Collaborators {
    pub cache: Arc<dyn ContentCache>,
    pub discovery: Arc<dyn LinkDiscovery>,
    pub fetcher: Arc<dyn Fetcher>,
    pub factory: Arc<dyn CandidateFactory>,
}

/// Outcome of the candidates of one case.
struct CaseOutcome {
    results: Vec<EvaluationResult>,
    skipped: u64,
}

pub struct Benchmark {
    config: BenchConfig,
    plan: BenchPlan,
    runner: CandidateRunner,
    store: AgentStore,
}

impl Benchmark {
    pub fn new(config: BenchConfig, plan: BenchPlan, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;
        plan.validate()?;
        let pool = Arc::new(ResourcePool::new(
            collaborators.cache,
            collaborators.discovery,
            collaborators.fetcher,
        ));
        let runner = CandidateRunner::new(pool, collaborators.factory, config.link_limit);
        let store = AgentStore::new(&config.agents_dir)?;
        Ok(Self {
            config,
            plan,
            runner,
            store,
        })
    }

    pub fn store(&self) -> &AgentStore {
        &self.store
    }

    pub fn plan(&self) -> &BenchPlan {
        &self.plan
    }

    /// Run every case and return the run summary.
    pub async fn run(&self) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let order = self.plan.order();
        let voter = MajorityVoter::new(order.clone(), self.plan.weights.clone());
        let mut scoreboard = Scoreboard::new(&order);
        let mut ledger = UsageLedger::new();
        let mut skipped = 0;

        info!(
            run_id = %run_id,
            cases = self.plan.cases.len(),
            candidates = order.len(),
            parallel = self.config.parallel_candidates,
            "benchmark started"
        );

        for candidate in self.plan.candidates.iter().filter(|c| !c.is_human()) {
            self.store.ensure_agent(candidate)?;
        }

        let total_cases = self.plan.cases.len();
        for (index, case) in self.plan.cases.iter().enumerate() {
            let _span = CaseSpan::enter(&case.seed_url, index + 1, total_cases);
            obs::emit_case_started(&case.seed_url, order.len());

            let outcome = self.run_case(index, case, &voter, &mut scoreboard).await;
            self.runner.pool().clear();
            let outcome = outcome?;

            skipped += outcome.skipped;
            ledger = outcome.results.iter().fold(ledger, UsageLedger::fold);
        }

        METRICS.flush();
        info!(run_id = %run_id, skipped, "benchmark finished");
        Ok(RunSummary::new(run_id, &ledger, scoreboard, skipped))
    }

    async fn run_case(
        &self,
        case_index: usize,
        case: &BenchmarkCase,
        voter: &MajorityVoter,
        scoreboard: &mut Scoreboard,
    ) -> Result<CaseOutcome> {
        let outcome = if self.config.parallel_candidates {
            self.evaluate_parallel(case_index, case).await?
        } else {
            self.evaluate_sequential(case_index, case).await?
        };

        self.vote_and_score(case, &outcome.results, voter, scoreboard)?;
        Ok(outcome)
    }

    async fn evaluate_sequential(&self, case_index: usize, case: &BenchmarkCase) -> Result<CaseOutcome> {
        let mut results = Vec::new();
        let mut skipped = 0;
        for (offset, candidate) in self.plan.candidates.iter().enumerate() {
            self.log_progress(case_index, offset, case, candidate);
            let outcome = self.runner.evaluate(case, candidate).await;
            if let Some(result) = self.triage(candidate, outcome)? {
                self.record(case, candidate, &result).await?;
                results.push(result);
            } else {
                skipped += 1;
            }
        }
        Ok(CaseOutcome { results, skipped })
    }

    async fn evaluate_parallel(&self, case_index: usize, case: &BenchmarkCase) -> Result<CaseOutcome> {
        let evaluations = self.plan.candidates.iter().enumerate().map(|(offset, candidate)| {
            self.log_progress(case_index, offset, case, candidate);
            self.runner.evaluate(case, candidate)
        });
        let outcomes = join_all(evaluations).await;

        // Barrier passed; record in configured order so the manifest has a
        // single writer.
        let mut results = Vec::new();
        let mut skipped = 0;
        for (candidate, outcome) in self.plan.candidates.iter().zip(outcomes) {
            if let Some(result) = self.triage(candidate, outcome)? {
                self.record(case, candidate, &result).await?;
                results.push(result);
            } else {
                skipped += 1;
            }
        }
        Ok(CaseOutcome { results, skipped })
    }

    fn log_progress(&self, case_index: usize, offset: usize, case: &BenchmarkCase, candidate: &Candidate) {
        let count = case_index * self.plan.candidates.len() + offset + 1;
        let total = self.plan.cases.len() * self.plan.candidates.len();
        info!("Evaluating {} -> {} ({}/{})", case.seed_url, candidate.id(), count, total);
    }

    /// Keep successes, skip recoverable failures, propagate the rest.
    fn triage(&self, candidate: &Candidate, outcome: Result<EvaluationResult>) -> Result<Option<EvaluationResult>> {
        match outcome {
            Ok(result) => {
                obs::emit_candidate_finished(result.candidate.as_str(), result.items.len(), result.wall_clock_secs);
                Ok(Some(result))
            }
            Err(e) if e.is_recoverable() => {
                let id = candidate.id();
                error!("ERROR! Skip `{}`", id);
                obs::emit_candidate_skipped(id.as_str(), &e);
                METRICS.inc_candidates_skipped();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Record `result` against ground truth, when the case has any.
    async fn record(&self, case: &BenchmarkCase, candidate: &Candidate, result: &EvaluationResult) -> Result<()> {
        if candidate.is_human() {
            return Ok(());
        }
        let Some(expected) = self.runner.ground_truth(case).await? else {
            info!(case = %case.seed_url, candidate = %result.candidate, "no ground truth; not recorded");
            return Ok(());
        };

        match self
            .store
            .reset_for_case(&result.candidate, &case.seed_url, self.config.link_limit)?
        {
            ResetDecision::Protected { .. } => Ok(()),
            ResetDecision::Clear => {
                self.store
                    .record_result(&result.candidate, &case.seed_url, result, &expected)?;
                Ok(())
            }
        }
    }

    fn vote_and_score(
        &self,
        case: &BenchmarkCase,
        results: &[EvaluationResult],
        voter: &MajorityVoter,
        scoreboard: &mut Scoreboard,
    ) -> Result<()> {
        // Item count and item URLs come from the first successful candidate.
        let Some(first) = results.first() else {
            warn!(case = %case.seed_url, "every candidate failed; nothing to vote on");
            return Ok(());
        };

        let joined = case.joined_questions();
        for (index, item) in first.items.iter().enumerate() {
            let answers: BTreeMap<CandidateId, AnswerSet> = results
                .iter()
                .filter_map(|r| r.answers(index).map(|a| (r.candidate.clone(), a.clone())))
                .collect();

            let majority = voter.compute(&case.questions, &answers);
            save_majority(self.runner.pool().cache().as_ref(), &item.url, &joined, &majority)?;

            info!("majority answers for {}", item.url);
            for (question, answer) in majority.iter() {
                info!("\t{}: {}", question, preview(answer));
            }
            obs::emit_majority_computed(&item.url, case.questions.len(), majority.len());

            scoreboard.record_item(voter.order(), &case.questions, &answers, &majority);
        }
        Ok(())
    }
}
