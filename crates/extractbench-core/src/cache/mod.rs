pub mod fs;

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

const SLUG_PREFIX_LEN: usize = 30;
const HASH_PREFIX_LEN: usize = 10;

fn slug_separator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9]+").expect("static slug pattern"))
}

/// Derive the cache filename for an ordered tuple of key parts.
///
/// Parts are stringified and joined with `-`; every run of non-alphanumeric
/// characters collapses to a single `-`. The filename is the first 30 slug
/// characters followed by the first 10 hex chars of the slug's SHA-256.
pub fn generate_key<I, T>(parts: I) -> String
where
    I: IntoIterator<Item = T>,
    T: ToString,
{
    let joined = parts
        .into_iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("-");
    let slug = slug_separator().replace_all(&joined, "-");
    let hash = hex::encode(Sha256::digest(slug.as_bytes()));

    // The slug is pure ASCII at this point, so byte slicing is char-safe.
    let prefix = &slug[..slug.len().min(SLUG_PREFIX_LEN)];
    format!("{}-{}.json", prefix, &hash[..HASH_PREFIX_LEN])
}

/// An ordered tuple of key parts addressing one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    parts: Vec<String>,
}

impl CacheKey {
    pub fn new<I, T>(parts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        Self {
            parts: parts.into_iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Key of a fetched document.
    pub fn document(url: &str) -> Self {
        Self::new(["doc", url])
    }

    /// Key of a discovered link list.
    pub fn links(seed_url: &str, prompt: &str, limit: usize) -> Self {
        Self::new(["link".to_string(), seed_url.to_string(), prompt.to_string(), limit.to_string()])
    }

    /// Key of a per-item answer set (consensus or ground truth).
    pub fn answers(item_url: &str, joined_questions: &str) -> Self {
        Self::new(["answer", item_url, joined_questions])
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn filename(&self) -> String {
        generate_key(&self.parts)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.filename())
    }
}

/// Cache namespaces (one directory each).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// Fetched documents, shared by every candidate of a run.
    Docs,
    /// Discovered link lists.
    Links,
    /// Consensus answers.
    Majority,
    /// Operator-provided ground truth.
    Human,
}

impl Namespace {
    pub const ALL: [Namespace; 4] = [Self::Docs, Self::Links, Self::Majority, Self::Human];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Docs => "docs",
            Self::Links => "links",
            Self::Majority => "majority",
            Self::Human => "human",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("corrupt cache entry {namespace}/{filename}: {source}")]
    Corrupt {
        namespace: Namespace,
        filename: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// Namespaced JSON blob store.
///
/// Writes are last-write-wins; a single writer per entry is assumed.
pub trait ContentCache: Send + Sync {
    /// Load the entry for `key`, or `None` when it does not exist.
    fn load_value(&self, namespace: Namespace, key: &CacheKey) -> Result<Option<serde_json::Value>>;

    /// Store `value` under `key`, overwriting any existing entry.
    fn save_value(&self, namespace: Namespace, key: &CacheKey, value: &serde_json::Value) -> Result<()>;
}

/// Typed access on top of [`ContentCache`].
pub trait ContentCacheExt: ContentCache {
    fn load<T: DeserializeOwned>(&self, namespace: Namespace, key: &CacheKey) -> Result<Option<T>> {
        match self.load_value(namespace, key)? {
            Some(value) => serde_json::from_value(value).map(Some).map_err(|source| {
                CacheError::Corrupt {
                    namespace,
                    filename: key.filename(),
                    source,
                }
            }),
            None => Ok(None),
        }
    }

    fn save<T: Serialize + ?Sized>(&self, namespace: Namespace, key: &CacheKey, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.save_value(namespace, key, &value)
    }
}

impl<C: ContentCache + ?Sized> ContentCacheExt for C {}
