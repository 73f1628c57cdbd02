//! extractbench - benchmark runner for AI web-extraction candidates
//!
//! Runs every configured case against every configured candidate, votes a
//! weighted consensus per answer and prints a JSON summary of usage, cost,
//! time and agreement.
//!
//! ## Commands
//!
//! - `run` (default): run the benchmark
//! - `plan`: print the resolved cases, candidates and weights
//! - `agents`: print the stored per-candidate accuracy records

mod catalog;
mod plan_file;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use extractbench_core::telemetry::init_tracing;
use extractbench_core::{
    write_summary_json, AgentStore, BenchConfig, BenchPlan, Benchmark, Collaborators, Fetcher,
};
use extractbench_providers::{ChatClient, ChatLinkDiscovery, HttpFetcher, Pricing, ProviderFactory};
use serde::Serialize;
use tracing::{info, Level};

use plan_file::PlanFile;

#[derive(Parser)]
#[command(name = "extractbench")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Benchmark AI extraction candidates with weighted voting", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// TOML plan file (settings, cases, candidates, weights)
    #[arg(short, long, global = true, env = "EXTRACTBENCH_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP timeout for fetches and AI calls, in seconds
    #[arg(long, global = true, default_value = "120", env = "EXTRACTBENCH_TIMEOUT")]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the benchmark and print the summary
    Run {
        /// Also write the summary to this file
        #[arg(long, env = "EXTRACTBENCH_SUMMARY_OUT")]
        summary_out: Option<PathBuf>,
    },

    /// Print the resolved plan without running anything
    Plan,

    /// Print stored accuracy per candidate
    Agents,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(cli.json, level);

    let (config, plan) = resolve_plan(cli.config.as_deref())?;
    let timeout = Duration::from_secs(cli.timeout_secs);

    match cli.command.unwrap_or(Commands::Run { summary_out: None }) {
        Commands::Run { summary_out } => cmd_run(config, plan, timeout, summary_out.as_deref()).await,
        Commands::Plan => cmd_plan(&config, &plan),
        Commands::Agents => cmd_agents(&config),
    }
}

fn resolve_plan(path: Option<&Path>) -> Result<(BenchConfig, BenchPlan)> {
    let file = match path {
        Some(path) => PlanFile::load(path)?,
        None => PlanFile::default(),
    };
    let (config, plan) = file.resolve();
    config.validate().context("invalid settings")?;
    plan.validate().context("invalid plan")?;
    Ok((config, plan))
}

async fn cmd_run(config: BenchConfig, plan: BenchPlan, timeout: Duration, summary_out: Option<&Path>) -> Result<()> {
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(timeout).context("build HTTP client")?);
    let crawler = ChatClient::from_env(&config.crawler_ai, Pricing::default(), timeout)
        .with_context(|| format!("crawler AI {}", config.crawler_ai))?;
    let collaborators = Collaborators {
        cache: Arc::new(config.build_cache()),
        discovery: Arc::new(ChatLinkDiscovery::new(Arc::clone(&fetcher), Arc::new(crawler))),
        fetcher,
        factory: Arc::new(ProviderFactory::new(timeout)),
    };

    info!(
        cache_root = %config.cache_root.display(),
        agents_dir = %config.agents_dir.display(),
        "starting benchmark"
    );
    let benchmark = Benchmark::new(config, plan, collaborators).context("set up benchmark")?;
    let summary = benchmark.run().await.context("benchmark aborted")?;

    println!("{}", summary.to_pretty_json()?);
    if let Some(path) = summary_out {
        write_summary_json(path, &summary)?;
        info!(path = %path.display(), "summary written");
    }
    Ok(())
}

#[derive(Serialize)]
struct PlanView<'a> {
    settings: &'a BenchConfig,
    cases: &'a [extractbench_core::BenchmarkCase],
    candidates: Vec<CandidateView>,
}

#[derive(Serialize)]
struct CandidateView {
    id: String,
    weight: u32,
    tags: Vec<String>,
}

fn cmd_plan(config: &BenchConfig, plan: &BenchPlan) -> Result<()> {
    let view = PlanView {
        settings: config,
        cases: &plan.cases,
        candidates: plan
            .candidates
            .iter()
            .map(|c| CandidateView {
                id: c.id().to_string(),
                weight: plan.weights.weight(&c.id()),
                tags: c.tags(),
            })
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

#[derive(Debug, Serialize, PartialEq)]
struct AgentView {
    id: String,
    cases: usize,
    correct: u64,
    total: u64,
    accuracy: f64,
}

fn agent_views(store: &AgentStore) -> Result<Vec<AgentView>> {
    Ok(store
        .records()?
        .into_iter()
        .map(|record| AgentView {
            id: record.id.to_string(),
            cases: record.processed.len(),
            correct: record.overall.correct,
            total: record.overall.total,
            accuracy: record.accuracy(),
        })
        .collect())
}

fn cmd_agents(config: &BenchConfig) -> Result<()> {
    let store = AgentStore::new(&config.agents_dir)
        .with_context(|| format!("open {:?}", config.agents_dir))?;
    println!("{}", serde_json::to_string_pretty(&agent_views(&store)?)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use extractbench_core::{AnswerSet, EvaluationResult, ItemResult, MetricSnapshot};

    #[test]
    fn cli_defaults_to_run() {
        let cli = Cli::try_parse_from(["extractbench"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.timeout_secs, 120);
    }

    #[test]
    fn cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "extractbench",
            "--json",
            "-c",
            "plan.toml",
            "run",
            "--summary-out",
            "out/summary.json",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.config.as_deref(), Some(Path::new("plan.toml")));
        match cli.command {
            Some(Commands::Run { summary_out }) => {
                assert_eq!(summary_out.as_deref(), Some(Path::new("out/summary.json")))
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn resolve_without_file_uses_catalog() {
        let (config, plan) = resolve_plan(None).unwrap();
        assert_eq!(config.link_limit, 10);
        assert_eq!(plan.cases.len(), catalog::cases().len());
    }

    #[test]
    fn resolve_rejects_invalid_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.toml");
        std::fs::write(&path, "[settings]\nlink_limit = 0\n").unwrap();
        assert!(resolve_plan(Some(&path)).is_err());
    }

    #[test]
    fn agent_views_report_accuracy() {
        let dir = tempfile::tempdir().unwrap();
        let store = AgentStore::new(dir.path()).unwrap();
        let id = extractbench_core::CandidateId::from("openai:gpt-4o/basic");
        let result = EvaluationResult {
            candidate: id.clone(),
            items: vec![ItemResult {
                url: "https://x/1".to_string(),
                answers: AnswerSet::new().with("Q", "a"),
                metrics: MetricSnapshot::default(),
                document: None,
            }],
            totals: MetricSnapshot::default(),
            wall_clock_secs: 0.0,
        };
        let expected = vec![AnswerSet::new().with("Q", "a").with("R", "b")];
        store.record_result(&id, "https://x", &result, &expected).unwrap();

        let views = agent_views(&store).unwrap();
        assert_eq!(
            views,
            vec![AgentView {
                id: "openai:gpt-4o/basic".to_string(),
                cases: 1,
                correct: 1,
                total: 2,
                accuracy: 0.5,
            }]
        );
    }
}
