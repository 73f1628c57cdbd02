use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

use crate::domain::CandidateId;
use crate::scoreboard::{Scoreboard, UsageLedger};

/// Final summary of a benchmark run, printed to stdout as pretty JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub usage: BTreeMap<CandidateId, BTreeMap<String, u64>>,
    pub cost: BTreeMap<CandidateId, BTreeMap<String, f64>>,
    pub elapsed: BTreeMap<CandidateId, BTreeMap<String, f64>>,
    /// Wall-clock seconds per candidate, summed over cases.
    pub took: BTreeMap<CandidateId, f64>,
    pub scoreboard: Scoreboard,
    /// Candidate evaluations skipped after a collaborator failure.
    pub skipped: u64,
}

impl RunSummary {
    pub fn new(run_id: Uuid, ledger: &UsageLedger, scoreboard: Scoreboard, skipped: u64) -> Self {
        Self {
            run_id,
            generated_at: Utc::now(),
            usage: ledger.usage(),
            cost: ledger.cost(),
            elapsed: ledger.elapsed(),
            took: ledger.took.clone(),
            scoreboard,
            skipped,
        }
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialize run summary")
    }
}

/// Write the run summary in pretty JSON format.
pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<()> {
    let content = summary.to_pretty_json()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
    }
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Render a short human-readable agreement table.
pub fn render_scoreboard_md(scoreboard: &Scoreboard) -> String {
    let mut out = String::new();
    out.push_str("| candidate | majority | total | rate |\n");
    out.push_str("|---|---|---|---|\n");
    for (id, entry) in scoreboard.iter() {
        out.push_str(&format!(
            "| `{}` | {} | {} | {:.1}% |\n",
            id,
            entry.majority,
            entry.total,
            entry.agreement_rate() * 100.0
        ));
    }
    out
}
