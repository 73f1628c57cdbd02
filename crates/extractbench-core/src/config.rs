//! Run settings.
//!
//! Every field has a default so an empty settings table is a valid
//! configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::fs::FsContentCache;
use crate::cache::Namespace;
use crate::domain::{BenchError, Result};

pub const DEFAULT_LINK_LIMIT: usize = 10;
pub const DEFAULT_CRAWLER_AI: &str = "openai:gpt-4o";

/// Settings of one benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Root of the content cache.
    pub cache_root: PathBuf,

    /// Directory holding one record per candidate plus `list.json`.
    pub agents_dir: PathBuf,

    /// Maximum number of links discovered per case.
    pub link_limit: usize,

    /// AI used by link discovery.
    pub crawler_ai: String,

    /// Evaluate the candidates of a case concurrently.
    pub parallel_candidates: bool,

    /// Per-namespace cache TTL in seconds. Namespaces without an entry never
    /// expire.
    pub ttls: BTreeMap<Namespace, u64>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            cache_root: PathBuf::from("./data"),
            agents_dir: PathBuf::from("./out/agents"),
            link_limit: DEFAULT_LINK_LIMIT,
            crawler_ai: DEFAULT_CRAWLER_AI.to_string(),
            parallel_candidates: false,
            ttls: BTreeMap::new(),
        }
    }
}

impl BenchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.link_limit == 0 {
            return Err(BenchError::InvalidConfig("link_limit must be at least 1".into()));
        }
        if self.crawler_ai.trim().is_empty() {
            return Err(BenchError::InvalidConfig("crawler_ai must not be empty".into()));
        }
        Ok(())
    }

    /// Filesystem cache rooted at `cache_root` with the configured TTLs.
    pub fn build_cache(&self) -> FsContentCache {
        self.ttls
            .iter()
            .fold(FsContentCache::new(&self.cache_root), |cache, (ns, secs)| {
                cache.with_ttl(*ns, Duration::from_secs(*secs))
            })
    }
}
