//! Candidate evaluation.
//!
//! [`CandidateRunner::evaluate`] runs one candidate over every link of one
//! case. Links and documents go through a run-scoped [`ResourcePool`] backed
//! by the content cache, so a document is fetched at most once per run even
//! when several candidates evaluate the same case concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use crate::cache::{CacheKey, ContentCache, ContentCacheExt, Namespace};
use crate::collaborators::{CandidateFactory, Fetcher, LinkDiscovery};
use crate::domain::{
    AnswerSet, BenchmarkCase, Candidate, CandidateId, Document, ItemAnswers, Link,
    MetricSnapshot, Result,
};
use crate::metrics::METRICS;

const PREVIEW_CHARS: usize = 80;

/// Outcome of one candidate on one link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResult {
    pub url: String,
    pub answers: AnswerSet,
    /// Usage attributable to this item alone.
    pub metrics: MetricSnapshot,
    /// The document the answers were extracted from. `None` for ground truth.
    #[serde(skip)]
    pub document: Option<Arc<Document>>,
}

/// Outcome of one candidate on one case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub candidate: CandidateId,
    pub items: Vec<ItemResult>,
    /// Sum of the per-item metric deltas.
    pub totals: MetricSnapshot,
    pub wall_clock_secs: f64,
}

impl EvaluationResult {
    /// Answers of item `index`, if the candidate produced that many items.
    pub fn answers(&self, index: usize) -> Option<&AnswerSet> {
        self.items.get(index).map(|item| &item.answers)
    }
}

type Slot<T> = Arc<OnceCell<T>>;

/// Run-scoped, deduplicating access to discovered links and fetched documents.
///
/// Each key is resolved at most once: concurrent callers of the same key
/// wait on the same in-flight load instead of racing their own.
pub struct ResourcePool {
    cache: Arc<dyn ContentCache>,
    discovery: Arc<dyn LinkDiscovery>,
    fetcher: Arc<dyn Fetcher>,
    links: Mutex<HashMap<CacheKey, Slot<Arc<Vec<Link>>>>>,
    documents: Mutex<HashMap<String, Slot<Arc<Document>>>>,
}

impl ResourcePool {
    pub fn new(
        cache: Arc<dyn ContentCache>,
        discovery: Arc<dyn LinkDiscovery>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            cache,
            discovery,
            fetcher,
            links: Mutex::new(HashMap::new()),
            documents: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &Arc<dyn ContentCache> {
        &self.cache
    }

    /// Discovered links for `case`, from memory, the `links` cache, or the
    /// discovery collaborator, in that order.
    pub async fn links(&self, case: &BenchmarkCase, limit: usize) -> Result<Arc<Vec<Link>>> {
        let key = CacheKey::links(&case.seed_url, &case.link_prompt, limit);
        let slot = slot_for(&self.links, key.clone());
        let links = slot
            .get_or_try_init(|| async {
                if let Some(links) = self.cache.load::<Vec<Link>>(Namespace::Links, &key)? {
                    debug!(seed_url = %case.seed_url, count = links.len(), "links from cache");
                    return Ok(Arc::new(links));
                }
                let mut links = self
                    .discovery
                    .discover(&case.seed_url, &case.link_prompt, limit)
                    .await?;
                links.truncate(limit);
                self.cache.save(Namespace::Links, &key, &links)?;
                info!(seed_url = %case.seed_url, count = links.len(), "links discovered");
                Ok::<_, crate::domain::BenchError>(Arc::new(links))
            })
            .await?;
        Ok(Arc::clone(links))
    }

    /// The document at `url`, from memory, the `docs` cache, or the fetch
    /// collaborator, in that order.
    pub async fn document(&self, url: &str) -> Result<Arc<Document>> {
        let slot = slot_for(&self.documents, url.to_string());
        let doc = slot
            .get_or_try_init(|| async {
                let key = CacheKey::document(url);
                if let Some(doc) = self.cache.load::<Document>(Namespace::Docs, &key)? {
                    return Ok(Arc::new(doc));
                }
                let doc = self.fetcher.fetch(url).await?;
                METRICS.inc_documents_fetched();
                self.cache.save(Namespace::Docs, &key, &doc)?;
                Ok::<_, crate::domain::BenchError>(Arc::new(doc))
            })
            .await?;
        Ok(Arc::clone(doc))
    }

    /// Drop the in-memory copies. Cache entries on disk are kept.
    pub fn clear(&self) {
        lock(&self.links).clear();
        lock(&self.documents).clear();
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn slot_for<K, T>(map: &Mutex<HashMap<K, Slot<T>>>, key: K) -> Slot<T>
where
    K: std::hash::Hash + Eq,
{
    Arc::clone(lock(map).entry(key).or_default())
}

/// Runs candidates against cases.
pub struct CandidateRunner {
    pool: Arc<ResourcePool>,
    factory: Arc<dyn CandidateFactory>,
    link_limit: usize,
}

impl CandidateRunner {
    pub fn new(pool: Arc<ResourcePool>, factory: Arc<dyn CandidateFactory>, link_limit: usize) -> Self {
        Self {
            pool,
            factory,
            link_limit,
        }
    }

    pub fn pool(&self) -> &Arc<ResourcePool> {
        &self.pool
    }

    pub fn link_limit(&self) -> usize {
        self.link_limit
    }

    /// Evaluate `candidate` on every discovered link of `case`.
    ///
    /// Collaborator failures propagate; the caller decides whether to skip.
    #[instrument(skip_all, fields(case = %case.seed_url, candidate = %candidate.id()))]
    pub async fn evaluate(&self, case: &BenchmarkCase, candidate: &Candidate) -> Result<EvaluationResult> {
        let started = Instant::now();
        let links = self.pool.links(case, self.link_limit).await?;

        let items = if candidate.is_human() {
            self.ground_truth_items(case, &links)?
        } else {
            self.extract_items(case, candidate, &links).await?
        };

        let totals = MetricSnapshot::sum(items.iter().map(|item| &item.metrics));
        METRICS.inc_candidates_evaluated();

        Ok(EvaluationResult {
            candidate: candidate.id(),
            items,
            totals,
            wall_clock_secs: started.elapsed().as_secs_f64(),
        })
    }

    async fn extract_items(
        &self,
        case: &BenchmarkCase,
        candidate: &Candidate,
        links: &[Link],
    ) -> Result<Vec<ItemResult>> {
        let id = candidate.id();
        let session = self.factory.open(candidate)?;
        let mut items = Vec::with_capacity(links.len());

        for link in links {
            info!("- {} -> {}", link.url, id);
            let document = self.pool.document(&link.url).await?;

            // The meter is cumulative over the whole session: diff around the call.
            let before = session.meter.snapshot();
            let extracted = session.extractor.extract(&document, &case.questions).await?;
            let after = session.meter.snapshot();

            let answers = extracted.unwrap_or_default();
            log_answers(&link.url, &answers);

            items.push(ItemResult {
                url: link.url.clone(),
                answers,
                metrics: MetricSnapshot::delta(&after, &before),
                document: Some(document),
            });
        }
        Ok(items)
    }

    /// Operator-provided answers from the `human` namespace; missing entries
    /// read as empty answer sets.
    fn ground_truth_items(&self, case: &BenchmarkCase, links: &[Link]) -> Result<Vec<ItemResult>> {
        let joined = case.joined_questions();
        links
            .iter()
            .map(|link| {
                Ok(ItemResult {
                    url: link.url.clone(),
                    answers: self.human_answers(&link.url, &joined)?.unwrap_or_default(),
                    metrics: MetricSnapshot::default(),
                    document: None,
                })
            })
            .collect()
    }

    /// Ground truth for every discovered link of `case`, in link order.
    /// `None` unless every link has a `human` entry.
    pub async fn ground_truth(&self, case: &BenchmarkCase) -> Result<Option<Vec<AnswerSet>>> {
        let links = self.pool.links(case, self.link_limit).await?;
        if links.is_empty() {
            return Ok(None);
        }
        let joined = case.joined_questions();
        let mut expected = Vec::with_capacity(links.len());
        for link in links.iter() {
            match self.human_answers(&link.url, &joined)? {
                Some(answers) => expected.push(answers),
                None => return Ok(None),
            }
        }
        Ok(Some(expected))
    }

    fn human_answers(&self, item_url: &str, joined_questions: &str) -> Result<Option<AnswerSet>> {
        let key = CacheKey::answers(item_url, joined_questions);
        let stored: Option<ItemAnswers> = self.pool.cache().load(Namespace::Human, &key)?;
        Ok(stored.map(|s| s.data))
    }
}

fn log_answers(url: &str, answers: &AnswerSet) {
    info!("{} ->", url);
    for (_, answer) in answers.iter() {
        info!("\t- {}", preview(answer));
    }
}

/// Single-line answer preview, truncated to 80 characters.
pub fn preview(answer: &str) -> String {
    let flat: String = answer.chars().filter(|c| *c != '\n').collect();
    if flat.chars().count() > PREVIEW_CHARS {
        let head: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        flat
    }
}
