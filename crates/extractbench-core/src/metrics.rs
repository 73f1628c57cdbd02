//! Global atomic counters for extractbench observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a run).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters. No allocations or locking.
pub struct Metrics {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    documents_fetched: AtomicU64,
    candidates_evaluated: AtomicU64,
    candidates_skipped: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            documents_fetched: AtomicU64::new(0),
            candidates_evaluated: AtomicU64::new(0),
            candidates_skipped: AtomicU64::new(0),
        }
    }

    pub fn inc_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "cache_hits", "counter incremented");
    }

    pub fn inc_cache_misses(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "cache_misses", "counter incremented");
    }

    /// Increment when the fetch collaborator is actually invoked.
    pub fn inc_documents_fetched(&self) {
        self.documents_fetched.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "documents_fetched", "counter incremented");
    }

    pub fn inc_candidates_evaluated(&self) {
        self.candidates_evaluated.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "candidates_evaluated", "counter incremented");
    }

    pub fn inc_candidates_skipped(&self) {
        self.candidates_skipped.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "candidates_skipped", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    ///
    /// Call this at natural boundaries (end of a run) rather than on every
    /// increment.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            cache_hits = self.cache_hits(),
            cache_misses = self.cache_misses(),
            documents_fetched = self.documents_fetched(),
            candidates_evaluated = self.candidates_evaluated(),
            candidates_skipped = self.candidates_skipped(),
        );
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn documents_fetched(&self) -> u64 {
        self.documents_fetched.load(Ordering::Relaxed)
    }

    pub fn candidates_evaluated(&self) -> u64 {
        self.candidates_evaluated.load(Ordering::Relaxed)
    }

    pub fn candidates_skipped(&self) -> u64 {
        self.candidates_skipped.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
        self.documents_fetched.store(0, Ordering::Relaxed);
        self.candidates_evaluated.store(0, Ordering::Relaxed);
        self.candidates_skipped.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        assert_eq!(m.cache_hits(), 0);
        m.inc_cache_hits();
        m.inc_cache_hits();
        assert_eq!(m.cache_hits(), 2);

        m.inc_cache_misses();
        assert_eq!(m.cache_misses(), 1);

        m.inc_documents_fetched();
        m.inc_candidates_evaluated();
        m.inc_candidates_skipped();
        m.inc_candidates_skipped();
        assert_eq!(m.documents_fetched(), 1);
        assert_eq!(m.candidates_evaluated(), 1);
        assert_eq!(m.candidates_skipped(), 2);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_cache_hits();
        m.inc_cache_misses();
        m.inc_documents_fetched();
        m.inc_candidates_evaluated();
        m.inc_candidates_skipped();
        m.reset();
        assert_eq!(m.cache_hits(), 0);
        assert_eq!(m.cache_misses(), 0);
        assert_eq!(m.documents_fetched(), 0);
        assert_eq!(m.candidates_evaluated(), 0);
        assert_eq!(m.candidates_skipped(), 0);
    }
}
