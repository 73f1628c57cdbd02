//! In-memory fakes for the cache and collaborator traits (testing only)
//!
//! Provides `MemoryContentCache`, `ScriptedDiscovery`, `CountingFetcher`,
//! `ScriptedExtractor` / `FakeMeter` and `FakeFactory`, which satisfy the
//! trait contracts without network or filesystem access.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{self, CacheKey, ContentCache, Namespace};
use crate::collaborators::{
    CandidateFactory, CandidateSession, CollaboratorResult, Extractor, Fetcher, LinkDiscovery,
    UsageMeter,
};
use crate::domain::{AnswerSet, Candidate, CandidateId, CollaboratorError, Document, Link, MetricSnapshot};

// ---------------------------------------------------------------------------
// MemoryContentCache
// ---------------------------------------------------------------------------

/// Content cache backed by a `HashMap<(namespace, filename), value>`.
#[derive(Debug, Default)]
pub struct MemoryContentCache {
    entries: Mutex<HashMap<(Namespace, String), serde_json::Value>>,
}

impl MemoryContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries stored under `namespace`.
    pub fn count(&self, namespace: Namespace) -> usize {
        self.entries
            .lock()
            .unwrap()
            .keys()
            .filter(|(ns, _)| *ns == namespace)
            .count()
    }
}

impl ContentCache for MemoryContentCache {
    fn load_value(&self, namespace: Namespace, key: &CacheKey) -> cache::Result<Option<serde_json::Value>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.get(&(namespace, key.filename())).cloned())
    }

    fn save_value(&self, namespace: Namespace, key: &CacheKey, value: &serde_json::Value) -> cache::Result<()> {
        let mut entries = self.entries.lock().unwrap();
        entries.insert((namespace, key.filename()), value.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ScriptedDiscovery
// ---------------------------------------------------------------------------

/// Link discovery answering from a fixed seed url -> links table.
///
/// Unknown seeds discover nothing; seeds marked failing return
/// `CollaboratorError::Discovery`.
#[derive(Debug, Default)]
pub struct ScriptedDiscovery {
    links: HashMap<String, Vec<Link>>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl ScriptedDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_links<I, S>(mut self, seed_url: &str, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.links
            .insert(seed_url.to_string(), urls.into_iter().map(Link::new).collect());
        self
    }

    pub fn failing(mut self, seed_url: &str) -> Self {
        self.failing.insert(seed_url.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkDiscovery for ScriptedDiscovery {
    async fn discover(&self, seed_url: &str, _prompt: &str, limit: usize) -> CollaboratorResult<Vec<Link>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(seed_url) {
            return Err(CollaboratorError::Discovery {
                url: seed_url.to_string(),
                reason: "scripted failure".to_string(),
            });
        }
        let mut links = self.links.get(seed_url).cloned().unwrap_or_default();
        links.truncate(limit);
        Ok(links)
    }
}

// ---------------------------------------------------------------------------
// CountingFetcher
// ---------------------------------------------------------------------------

/// Fetcher that synthesizes `<html>{url}</html>` and counts calls per URL.
///
/// An optional delay keeps fetches in flight long enough for concurrent
/// callers to overlap.
#[derive(Debug, Default)]
pub struct CountingFetcher {
    counts: Mutex<HashMap<String, usize>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
}

impl CountingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.counts.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.counts.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Fetcher for CountingFetcher {
    async fn fetch(&self, url: &str) -> CollaboratorResult<Document> {
        *self.counts.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(url) {
            return Err(CollaboratorError::Fetch {
                url: url.to_string(),
                reason: "scripted failure".to_string(),
            });
        }
        Ok(Document::new(url, format!("<html>{url}</html>")).with_content_type("text/html"))
    }
}

// ---------------------------------------------------------------------------
// FakeMeter / ScriptedExtractor
// ---------------------------------------------------------------------------

/// Cumulative meter advanced by [`ScriptedExtractor`] calls.
#[derive(Debug, Default)]
pub struct FakeMeter {
    current: Mutex<MetricSnapshot>,
}

impl FakeMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account one AI call consuming `tokens` input tokens.
    pub fn record_call(&self, tokens: u64) {
        let mut current = self.current.lock().unwrap();
        let call = MetricSnapshot::new()
            .with_usage("input", tokens)
            .with_usage("total", tokens)
            .with_cost("total", tokens as f64 / 1_000_000.0)
            .with_elapsed("requests", 0.25);
        *current = current.add(&call);
    }
}

impl UsageMeter for FakeMeter {
    fn snapshot(&self) -> MetricSnapshot {
        self.current.lock().unwrap().clone()
    }
}

/// What a scripted candidate answers.
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Answers per document URL.
    pub by_url: HashMap<String, AnswerSet>,
    /// Answers for URLs not in `by_url`; `None` extracts nothing.
    pub fallback: Option<AnswerSet>,
    /// Tokens charged to the meter per extraction.
    pub tokens_per_call: u64,
    /// Fail every extraction.
    pub fail: bool,
    /// Sleep before answering each extraction.
    pub delay: Option<Duration>,
}

impl Script {
    /// Answer `answers` for every document.
    pub fn always(answers: AnswerSet) -> Self {
        Self {
            fallback: Some(answers),
            tokens_per_call: 100,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_url(mut self, url: &str, answers: AnswerSet) -> Self {
        self.by_url.insert(url.to_string(), answers);
        self
    }

    pub fn with_tokens(mut self, tokens: u64) -> Self {
        self.tokens_per_call = tokens;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

pub struct ScriptedExtractor {
    script: Script,
    meter: Arc<FakeMeter>,
}

impl ScriptedExtractor {
    pub fn new(script: Script, meter: Arc<FakeMeter>) -> Self {
        Self { script, meter }
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn extract(&self, document: &Document, _questions: &[String]) -> CollaboratorResult<Option<AnswerSet>> {
        if let Some(delay) = self.script.delay {
            tokio::time::sleep(delay).await;
        }
        if self.script.fail {
            return Err(CollaboratorError::Extraction {
                url: document.url.clone(),
                reason: "scripted failure".to_string(),
            });
        }
        self.meter.record_call(self.script.tokens_per_call);
        Ok(self
            .script
            .by_url
            .get(&document.url)
            .or(self.script.fallback.as_ref())
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// FakeFactory
// ---------------------------------------------------------------------------

/// Candidate factory handing out scripted sessions, one fresh meter per open.
#[derive(Debug, Default)]
pub struct FakeFactory {
    scripts: BTreeMap<CandidateId, Script>,
    opened: AtomicUsize,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<CandidateId>, script: Script) -> Self {
        self.scripts.insert(id.into(), script);
        self
    }

    /// Sessions opened so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl CandidateFactory for FakeFactory {
    fn open(&self, candidate: &Candidate) -> CollaboratorResult<CandidateSession> {
        let id = candidate.id();
        let script = self
            .scripts
            .get(&id)
            .cloned()
            .ok_or_else(|| CollaboratorError::UnsupportedCandidate {
                candidate: id.to_string(),
                reason: "no script".to_string(),
            })?;
        self.opened.fetch_add(1, Ordering::SeqCst);
        let meter = Arc::new(FakeMeter::new());
        Ok(CandidateSession::new(
            Arc::new(ScriptedExtractor::new(script, Arc::clone(&meter))),
            meter,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ContentCacheExt;

    #[test]
    fn memory_cache_roundtrip() {
        let cache = MemoryContentCache::new();
        let key = CacheKey::document("https://x");
        cache.save(Namespace::Docs, &key, &Document::new("https://x", "body")).unwrap();
        let doc: Document = cache.load(Namespace::Docs, &key).unwrap().unwrap();
        assert_eq!(doc.body, "body");
        assert_eq!(cache.count(Namespace::Docs), 1);
        assert_eq!(cache.count(Namespace::Links), 0);
    }

    #[tokio::test]
    async fn fetcher_counts_per_url() {
        let fetcher = CountingFetcher::new();
        fetcher.fetch("https://a").await.unwrap();
        fetcher.fetch("https://a").await.unwrap();
        fetcher.fetch("https://b").await.unwrap();
        assert_eq!(fetcher.fetch_count("https://a"), 2);
        assert_eq!(fetcher.total_fetches(), 3);
    }

    #[tokio::test]
    async fn extractor_advances_meter() {
        let factory = FakeFactory::new().with("m/basic", Script::always(AnswerSet::new().with("Q", "A")));
        let session = factory.open(&Candidate::new("m", "basic")).unwrap();
        let doc = Document::new("https://a", "");
        let answers = session.extractor.extract(&doc, &[]).await.unwrap().unwrap();
        assert_eq!(answers.get("Q"), Some("A"));
        assert_eq!(session.meter.snapshot().usage["input"], 100);
    }

    #[tokio::test(start_paused = true)]
    async fn extractor_waits_for_scripted_delay() {
        let script = Script::always(AnswerSet::new().with("Q", "A")).with_delay(Duration::from_secs(5));
        let factory = FakeFactory::new().with("slow/basic", script);
        let session = factory.open(&Candidate::new("slow", "basic")).unwrap();
        let start = tokio::time::Instant::now();
        session.extractor.extract(&Document::new("https://a", ""), &[]).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[test]
    fn unknown_candidate_is_unsupported() {
        let err = FakeFactory::new().open(&Candidate::new("x", "y")).err().unwrap();
        assert!(matches!(err, CollaboratorError::UnsupportedCandidate { .. }));
    }
}
