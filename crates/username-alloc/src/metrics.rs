//! Metrics hooks for cache and allocation operations
//!
//! Thread-safe counters for monitoring how often the membership cache
//! short-circuits the authority, how often it is wrong, and how the
//! allocation paths behave under load.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector for the allocation subsystem
#[derive(Default)]
pub struct Metrics {
    /// Cache answered "maybe present"
    pub cache_hits: AtomicU64,
    /// Cache answered "definitely absent"
    pub cache_misses: AtomicU64,
    /// Authoritative existence checks performed
    pub authority_checks: AtomicU64,
    /// Cache-positive answers the authority contradicted
    pub false_positives: AtomicU64,
    /// Cache-negative answers the authority contradicted (cross-instance drift)
    pub stale_repairs: AtomicU64,
    /// Successful allocations, all paths
    pub allocations: AtomicU64,
    /// Allocations that fell through to the timestamp suffix
    pub fallback_allocations: AtomicU64,
    /// Suggestions returned across all calls
    pub suggestions_returned: AtomicU64,
    /// Cold-start scans completed
    pub warmups: AtomicU64,
    /// Snapshots restored from the persistence store
    pub snapshots_restored: AtomicU64,
    /// Snapshots written to the persistence store
    pub snapshots_persisted: AtomicU64,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_authority_check(&self) {
        self.authority_checks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_false_positive(&self) {
        self.false_positives.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_repair(&self) {
        self.stale_repairs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_allocation(&self) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback_allocation(&self) {
        self.fallback_allocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_suggestions(&self, count: usize) {
        self.suggestions_returned
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_warmup(&self) {
        self.warmups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshot_restored(&self) {
        self.snapshots_restored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshot_persisted(&self) {
        self.snapshots_persisted.fetch_add(1, Ordering::Relaxed);
    }

    /// Fraction of cache queries answered "maybe present"
    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            authority_checks: self.authority_checks.load(Ordering::Relaxed),
            false_positives: self.false_positives.load(Ordering::Relaxed),
            stale_repairs: self.stale_repairs.load(Ordering::Relaxed),
            allocations: self.allocations.load(Ordering::Relaxed),
            fallback_allocations: self.fallback_allocations.load(Ordering::Relaxed),
            suggestions_returned: self.suggestions_returned.load(Ordering::Relaxed),
            warmups: self.warmups.load(Ordering::Relaxed),
            snapshots_restored: self.snapshots_restored.load(Ordering::Relaxed),
            snapshots_persisted: self.snapshots_persisted.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub authority_checks: u64,
    pub false_positives: u64,
    pub stale_repairs: u64,
    pub allocations: u64,
    pub fallback_allocations: u64,
    pub suggestions_returned: u64,
    pub warmups: u64,
    pub snapshots_restored: u64,
    pub snapshots_persisted: u64,
}
