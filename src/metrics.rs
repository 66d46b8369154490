// Catalog metrics
//
// Lock-free counters describing cache and build activity.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Counters shared between a [`CatalogCache`](crate::state::CatalogCache)
/// and the builds it starts.
#[derive(Debug)]
pub struct CatalogMetrics {
    /// Builds started (Idle -> Building transitions)
    pub builds_started: AtomicUsize,

    /// Builds that published a catalog
    pub builds_completed: AtomicUsize,

    /// Builds that failed because the provider was unavailable
    pub builds_failed: AtomicUsize,

    /// Builds stopped by `invalidate()` or teardown
    pub builds_cancelled: AtomicUsize,

    /// Chunks processed across all builds
    pub chunks_processed: AtomicU64,

    /// Records in published catalogs
    pub icons_indexed: AtomicU64,

    /// Names dropped because they failed to resolve
    pub items_skipped: AtomicU64,

    /// `get()` calls answered from a ready catalog
    pub cache_hits: AtomicU64,

    /// `get()` calls that joined a build already in flight
    pub joined_waiters: AtomicU64,

    /// Total time spent in completed builds, in milliseconds
    pub total_build_time_ms: AtomicU64,

    start_time: Instant,
}

impl CatalogMetrics {
    pub fn new() -> Self {
        Self {
            builds_started: AtomicUsize::new(0),
            builds_completed: AtomicUsize::new(0),
            builds_failed: AtomicUsize::new(0),
            builds_cancelled: AtomicUsize::new(0),
            chunks_processed: AtomicU64::new(0),
            icons_indexed: AtomicU64::new(0),
            items_skipped: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            joined_waiters: AtomicU64::new(0),
            total_build_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_build_started(&self) {
        self.builds_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_build_completed(&self) {
        self.builds_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_build_failed(&self) {
        self.builds_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_build_cancelled(&self) {
        self.builds_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chunk_processed(&self) {
        self.chunks_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_icons_indexed(&self, count: usize) {
        self.icons_indexed.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_item_skipped(&self) {
        self.items_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_joined_waiter(&self) {
        self.joined_waiters.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_build_time(&self, duration: Duration) {
        self.total_build_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average duration of a completed build in milliseconds
    pub fn avg_build_time_ms(&self) -> f64 {
        let total = self.total_build_time_ms.load(Ordering::Relaxed);
        let count = self.builds_completed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("=== Icon Catalog Metrics ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Builds: {} started, {} completed, {} failed, {} cancelled",
            self.builds_started.load(Ordering::Relaxed),
            self.builds_completed.load(Ordering::Relaxed),
            self.builds_failed.load(Ordering::Relaxed),
            self.builds_cancelled.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Build time: {:.2}s total (avg: {:.2}ms per build), {} chunks",
            self.total_build_time_ms.load(Ordering::Relaxed) as f64 / 1000.0,
            self.avg_build_time_ms(),
            self.chunks_processed.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Icons: {} indexed, {} skipped",
            self.icons_indexed.load(Ordering::Relaxed),
            self.items_skipped.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Requests: {} cache hits, {} joined in-flight builds",
            self.cache_hits.load(Ordering::Relaxed),
            self.joined_waiters.load(Ordering::Relaxed)
        );
    }
}

impl Default for CatalogMetrics {
    fn default() -> Self {
        Self::new()
    }
}
