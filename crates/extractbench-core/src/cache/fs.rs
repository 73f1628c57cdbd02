use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tempfile::NamedTempFile;
use tracing::debug;

use super::{CacheError, CacheKey, ContentCache, Namespace, Result};
use crate::metrics::METRICS;

/// Filesystem-backed content cache.
///
/// Layout: `<root>/<namespace>/<slug>-<hash>.json`
pub struct FsContentCache {
    root: PathBuf,
    ttls: BTreeMap<Namespace, Duration>,
}

impl FsContentCache {
    /// Create a cache rooted at `root`. Namespace directories are created lazily.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            ttls: BTreeMap::new(),
        }
    }

    /// Entries of `namespace` older than `ttl` read as absent.
    pub fn with_ttl(mut self, namespace: Namespace, ttl: Duration) -> Self {
        self.ttls.insert(namespace, ttl);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, namespace: Namespace, key: &CacheKey) -> PathBuf {
        self.root.join(namespace.as_str()).join(key.filename())
    }

    fn is_expired(&self, namespace: Namespace, path: &Path) -> Result<bool> {
        let Some(ttl) = self.ttls.get(&namespace) else {
            return Ok(false);
        };
        let modified = fs::metadata(path)?.modified()?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        Ok(age > *ttl)
    }
}

impl ContentCache for FsContentCache {
    fn load_value(&self, namespace: Namespace, key: &CacheKey) -> Result<Option<serde_json::Value>> {
        let path = self.entry_path(namespace, key);

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                METRICS.inc_cache_misses();
                return Ok(None);
            }
            Err(e) => return Err(CacheError::Io(e)),
        };

        if self.is_expired(namespace, &path)? {
            debug!(namespace = %namespace, file = %key, "cache entry expired");
            METRICS.inc_cache_misses();
            return Ok(None);
        }

        let value = serde_json::from_str(&raw).map_err(|source| CacheError::Corrupt {
            namespace,
            filename: key.filename(),
            source,
        })?;
        METRICS.inc_cache_hits();
        Ok(Some(value))
    }

    fn save_value(&self, namespace: Namespace, key: &CacheKey, value: &serde_json::Value) -> Result<()> {
        let dir = self.root.join(namespace.as_str());
        let path = dir.join(key.filename());
        fs::create_dir_all(&dir)?;

        // Atomic write: write to temp file in the same directory, then rename.
        let content = serde_json::to_string_pretty(value)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(namespace = %namespace, file = %key, "cache entry written");
        Ok(())
    }
}
