//! Global atomic counters for EvalHub observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a publish session).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters — no allocations, no locking.
pub struct Metrics {
    artifacts_uploaded: AtomicU64,
    upload_failures: AtomicU64,
    catalogs_built: AtomicU64,
    cards_published: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            artifacts_uploaded: AtomicU64::new(0),
            upload_failures: AtomicU64::new(0),
            catalogs_built: AtomicU64::new(0),
            cards_published: AtomicU64::new(0),
        }
    }

    pub fn inc_artifacts_uploaded(&self) {
        self.artifacts_uploaded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "artifacts_uploaded", "counter incremented");
    }

    pub fn inc_upload_failures(&self) {
        self.upload_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "upload_failures", "counter incremented");
    }

    pub fn inc_catalogs_built(&self) {
        self.catalogs_built.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "catalogs_built", "counter incremented");
    }

    pub fn inc_cards_published(&self) {
        self.cards_published.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "cards_published", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    ///
    /// Call this at natural boundaries (end of a publish session)
    /// rather than on every increment.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            artifacts_uploaded = self.artifacts_uploaded(),
            upload_failures = self.upload_failures(),
            catalogs_built = self.catalogs_built(),
            cards_published = self.cards_published(),
        );
    }

    pub fn artifacts_uploaded(&self) -> u64 {
        self.artifacts_uploaded.load(Ordering::Relaxed)
    }

    pub fn upload_failures(&self) -> u64 {
        self.upload_failures.load(Ordering::Relaxed)
    }

    pub fn catalogs_built(&self) -> u64 {
        self.catalogs_built.load(Ordering::Relaxed)
    }

    pub fn cards_published(&self) -> u64 {
        self.cards_published.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.artifacts_uploaded.store(0, Ordering::Relaxed);
        self.upload_failures.store(0, Ordering::Relaxed);
        self.catalogs_built.store(0, Ordering::Relaxed);
        self.cards_published.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        assert_eq!(m.artifacts_uploaded(), 0);
        m.inc_artifacts_uploaded();
        m.inc_artifacts_uploaded();
        assert_eq!(m.artifacts_uploaded(), 2);

        m.inc_upload_failures();
        assert_eq!(m.upload_failures(), 1);

        m.inc_catalogs_built();
        m.inc_cards_published();
        m.inc_cards_published();
        assert_eq!(m.catalogs_built(), 1);
        assert_eq!(m.cards_published(), 2);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_artifacts_uploaded();
        m.inc_upload_failures();
        m.inc_catalogs_built();
        m.inc_cards_published();
        m.reset();
        assert_eq!(m.artifacts_uploaded(), 0);
        assert_eq!(m.upload_failures(), 0);
        assert_eq!(m.catalogs_built(), 0);
        assert_eq!(m.cards_published(), 0);
    }
}
