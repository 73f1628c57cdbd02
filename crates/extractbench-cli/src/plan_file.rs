//! TOML plan files.
//!
//! ```toml
//! [settings]
//! link_limit = 5
//! parallel_candidates = true
//!
//! [[cases]]
//! seed_url = "https://news.ycombinator.com/"
//! link_prompt = "Find links to comment pages for each article"
//! questions = ["What is the title of the article?"]
//!
//! [[candidates]]
//! ai_id = "openai:gpt-4o"
//! extractor_id = "basic"
//! options = { minimize = "strip-markup", input_cost_per_mtok = 2.5 }
//!
//! [weights]
//! "openai:gpt-4o/basic" = 2
//! ```
//!
//! Sections left out fall back to the built-in catalog.

use std::path::Path;

use anyhow::{Context, Result};
use extractbench_core::{BenchConfig, BenchPlan, BenchmarkCase, Candidate, VoteWeights};
use serde::Deserialize;

use crate::catalog;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanFile {
    #[serde(default)]
    pub settings: Option<BenchConfig>,
    #[serde(default)]
    pub cases: Option<Vec<BenchmarkCase>>,
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
    #[serde(default)]
    pub weights: Option<VoteWeights>,
}

impl PlanFile {
    pub fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("parse plan file")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
        Self::parse(&raw).with_context(|| format!("load {:?}", path))
    }

    /// Settings and plan, with the catalog filling every missing section.
    pub fn resolve(self) -> (BenchConfig, BenchPlan) {
        let plan = BenchPlan::new(
            self.cases.unwrap_or_else(catalog::cases),
            self.candidates.unwrap_or_else(catalog::candidates),
            self.weights.unwrap_or_else(catalog::weights),
        );
        (self.settings.unwrap_or_default(), plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extractbench_core::Namespace;

    const FULL: &str = r#"
        [settings]
        cache_root = "/tmp/eb"
        link_limit = 3
        parallel_candidates = true
        ttls = { docs = 86400 }

        [[cases]]
        seed_url = "https://news.ycombinator.com/"
        link_prompt = "Find links to comment pages"
        questions = ["Title?", "Points?"]

        [[candidates]]
        ai_id = "openai:gpt-4o"
        extractor_id = "basic"
        options = { minimize = "strip-markup", max_chars = 20000 }

        [[candidates]]
        ai_id = "ollama:llama3.1:8b"
        extractor_id = "iterative-prompt"
        label = "llama-iter"

        [weights]
        "openai:gpt-4o/basic" = 2
    "#;

    #[test]
    fn full_file_overrides_catalog() {
        let (config, plan) = PlanFile::parse(FULL).unwrap().resolve();
        assert_eq!(config.link_limit, 3);
        assert!(config.parallel_candidates);
        assert_eq!(config.ttls[&Namespace::Docs], 86400);
        assert_eq!(config.crawler_ai, "openai:gpt-4o");

        assert_eq!(plan.cases.len(), 1);
        assert_eq!(plan.cases[0].questions.len(), 2);
        let ids: Vec<_> = plan.order().iter().map(|id| id.to_string()).collect();
        assert_eq!(ids, vec!["openai:gpt-4o/basic", "ollama:llama3.1:8b/llama-iter"]);
        assert_eq!(plan.candidates[0].options["minimize"], serde_json::json!("strip-markup"));
        assert_eq!(plan.weights.weight(&"openai:gpt-4o/basic".into()), 2);
        plan.validate().unwrap();
    }

    #[test]
    fn empty_file_is_the_catalog() {
        let (config, plan) = PlanFile::parse("").unwrap().resolve();
        assert_eq!(config, BenchConfig::default());
        assert_eq!(plan.cases, catalog::cases());
        assert_eq!(plan.candidates.len(), catalog::candidates().len());
    }

    #[test]
    fn unknown_section_is_rejected() {
        assert!(PlanFile::parse("[setting]\nlink_limit = 1").is_err());
    }

    #[test]
    fn load_reports_path() {
        let err = PlanFile::load(Path::new("/nonexistent/plan.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("plan.toml"));
    }
}
