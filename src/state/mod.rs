// Catalog cache
//
// CatalogCache owns the build lifecycle (Idle -> Building -> Ready), makes sure
// at most one build runs at a time, and lets every caller of get() share the
// result of that build.

use crate::metrics::CatalogMetrics;
use crate::models::{Catalog, CatalogSettings};
use crate::services::builder::{BuildError, CatalogBuilder};
use crate::services::theme::{IconThemeProvider, ProviderError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// Events emitted as the cache moves through its lifecycle.
#[derive(Clone, Debug, PartialEq)]
pub enum CatalogEvent {
    /// A build was started for the given generation
    BuildStarted { generation: u64 },

    /// A chunk finished
    Progress {
        generation: u64,
        processed: usize,
        total: usize,
    },

    /// A catalog was published
    BuildFinished { generation: u64, icons: usize },

    /// The provider could not be enumerated; waiters got an empty catalog
    BuildFailed { generation: u64, reason: String },

    /// The cache was reset to idle
    Invalidated,
}

/// Observable view of the cache lifecycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildStatus {
    Idle,
    Building { processed: usize, total: usize },
    Ready { icons: usize },
}

enum BuildState {
    Idle,
    Building {
        generation: u64,
        processed: usize,
        total: usize,
        cancel_tx: watch::Sender<bool>,
    },
    Ready(Catalog),
}

struct Lifecycle {
    state: BuildState,
    last_generation: u64,
    /// Task of the most recently started build. The next build awaits it
    /// before touching the provider.
    last_task: Option<JoinHandle<()>>,
}

/// Result of a finished build, tagged with its generation.
#[derive(Clone)]
struct Outcome {
    generation: u64,
    catalog: Catalog,
}

enum Ticket {
    Ready(Catalog),
    Wait(u64),
}

struct CacheInner {
    provider: Arc<dyn IconThemeProvider>,
    settings: CatalogSettings,
    runtime: Option<Handle>,
    lifecycle: Mutex<Lifecycle>,
    outcome_tx: watch::Sender<Option<Outcome>>,
    event_tx: broadcast::Sender<CatalogEvent>,
    metrics: Arc<CatalogMetrics>,
}

/// Memoized, single-flight access to the icon catalog.
///
/// - [`get()`](Self::get) returns the ready catalog, joins the build in
///   flight, or starts one. Two callers never both start a build.
/// - [`invalidate()`](Self::invalidate) cancels a running build and drops
///   the cached catalog.
/// - [`subscribe()`](Self::subscribe) streams [`CatalogEvent`]s.
///
/// Cloning yields another handle to the same cache. When the last handle is
/// dropped, a running build is cancelled at its next chunk boundary.
///
/// Builds are spawned on the runtime given to
/// [`with_runtime`](Self::with_runtime), or on the runtime `get()` is polled
/// from.
#[derive(Clone)]
pub struct CatalogCache {
    inner: Arc<CacheInner>,
}

impl CatalogCache {
    pub fn new(provider: Arc<dyn IconThemeProvider>, settings: CatalogSettings) -> Self {
        Self::build(provider, settings, None)
    }

    /// Spawn builds on `runtime` instead of the caller's runtime.
    pub fn with_runtime(
        provider: Arc<dyn IconThemeProvider>,
        settings: CatalogSettings,
        runtime: Handle,
    ) -> Self {
        Self::build(provider, settings, Some(runtime))
    }

    fn build(
        provider: Arc<dyn IconThemeProvider>,
        settings: CatalogSettings,
        runtime: Option<Handle>,
    ) -> Self {
        let (outcome_tx, _) = watch::channel(None);
        let (event_tx, _) = broadcast::channel(64);

        Self {
            inner: Arc::new(CacheInner {
                provider,
                settings,
                runtime,
                lifecycle: Mutex::new(Lifecycle {
                    state: BuildState::Idle,
                    last_generation: 0,
                    last_task: None,
                }),
                outcome_tx,
                event_tx,
                metrics: Arc::new(CatalogMetrics::new()),
            }),
        }
    }

    /// Get the catalog, building it first if needed.
    ///
    /// Never fails: a provider that cannot be enumerated yields an empty
    /// catalog and leaves the cache idle, so a later call retries. If the
    /// build this call joined is invalidated, the call keeps waiting and
    /// resolves with the next build that finishes.
    pub async fn get(&self) -> Catalog {
        match self.ticket() {
            Ticket::Ready(catalog) => catalog,
            Ticket::Wait(generation) => self.wait_for(generation).await,
        }
    }

    fn ticket(&self) -> Ticket {
        let mut lifecycle = self.inner.lifecycle.lock().unwrap();

        let existing = match &lifecycle.state {
            BuildState::Ready(catalog) => {
                self.inner.metrics.record_cache_hit();
                Some(Ticket::Ready(catalog.clone()))
            }
            BuildState::Building { generation, .. } => {
                self.inner.metrics.record_joined_waiter();
                Some(Ticket::Wait(*generation))
            }
            BuildState::Idle => None,
        };

        existing.unwrap_or_else(|| Ticket::Wait(self.start_build(&mut lifecycle)))
    }

    /// Idle -> Building. Called with the lifecycle lock held.
    fn start_build(&self, lifecycle: &mut Lifecycle) -> u64 {
        lifecycle.last_generation += 1;
        let generation = lifecycle.last_generation;

        let (cancel_tx, cancel_rx) = watch::channel(false);
        lifecycle.state = BuildState::Building {
            generation,
            processed: 0,
            total: 0,
            cancel_tx,
        };

        self.inner.metrics.record_build_started();
        let _ = self
            .inner
            .event_tx
            .send(CatalogEvent::BuildStarted { generation });
        tracing::info!("Starting icon catalog build (generation {})", generation);

        let provider = Arc::clone(&self.inner.provider);
        let settings = self.inner.settings.clone();
        let metrics = Arc::clone(&self.inner.metrics);
        let weak = Arc::downgrade(&self.inner);
        let previous = lifecycle.last_task.take();

        let task = async move {
            // A cancelled build may still be inside its blocking snapshot.
            if let Some(previous) = previous {
                let _ = previous.await;
            }

            let start = Instant::now();
            let progress_target = weak.clone();
            let on_progress = move |processed: usize, total: usize| {
                if let Some(inner) = progress_target.upgrade() {
                    inner.record_progress(generation, processed, total);
                }
            };

            let result = run_build(provider, settings, metrics, cancel_rx, on_progress).await;

            match weak.upgrade() {
                Some(inner) => inner.complete(generation, result, start.elapsed()),
                None => tracing::debug!("Catalog cache dropped before build {} finished", generation),
            }
        };

        let handle = match &self.inner.runtime {
            Some(runtime) => runtime.spawn(task),
            None => tokio::spawn(task),
        };
        lifecycle.last_task = Some(handle);

        generation
    }

    async fn wait_for(&self, generation: u64) -> Catalog {
        let mut outcome_rx = self.inner.outcome_tx.subscribe();
        let outcome = outcome_rx
            .wait_for(|outcome| {
                outcome
                    .as_ref()
                    .is_some_and(|outcome| outcome.generation >= generation)
            })
            .await;

        match outcome {
            Ok(outcome) => outcome
                .as_ref()
                .map(|outcome| outcome.catalog.clone())
                .unwrap_or_default(),
            Err(_) => Catalog::empty(),
        }
    }

    /// Cancel any running build, drop the cached catalog and return to idle.
    ///
    /// Safe to call in any state. Waiters of a cancelled build are not
    /// resolved with partial results.
    pub fn invalidate(&self) {
        let mut lifecycle = self.inner.lifecycle.lock().unwrap();
        let previous = std::mem::replace(&mut lifecycle.state, BuildState::Idle);

        match previous {
            BuildState::Idle => {
                tracing::debug!("Icon catalog already idle");
                return;
            }
            BuildState::Building {
                generation,
                processed,
                total,
                cancel_tx,
            } => {
                let _ = cancel_tx.send(true);
                self.inner.metrics.record_build_cancelled();
                tracing::info!(
                    "Cancelled icon catalog build {} at {}/{}",
                    generation,
                    processed,
                    total
                );
            }
            BuildState::Ready(catalog) => {
                tracing::info!("Cleared cached icon catalog ({} icons)", catalog.len());
            }
        }

        let _ = self.inner.event_tx.send(CatalogEvent::Invalidated);
    }

    /// Invalidate and log a metrics summary. Call when the owner shuts down.
    pub fn shutdown(&self) {
        self.invalidate();
        self.inner.metrics.log_summary();
    }

    pub fn status(&self) -> BuildStatus {
        let lifecycle = self.inner.lifecycle.lock().unwrap();
        match &lifecycle.state {
            BuildState::Idle => BuildStatus::Idle,
            BuildState::Building {
                processed, total, ..
            } => BuildStatus::Building {
                processed: *processed,
                total: *total,
            },
            BuildState::Ready(catalog) => BuildStatus::Ready {
                icons: catalog.len(),
            },
        }
    }

    /// The catalog if one is ready. Never starts a build.
    pub fn peek(&self) -> Option<Catalog> {
        let lifecycle = self.inner.lifecycle.lock().unwrap();
        match &lifecycle.state {
            BuildState::Ready(catalog) => Some(catalog.clone()),
            _ => None,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.inner.event_tx.subscribe()
    }

    pub fn metrics(&self) -> Arc<CatalogMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.inner.settings
    }
}

impl CacheInner {
    fn is_current(lifecycle: &Lifecycle, generation: u64) -> bool {
        matches!(
            lifecycle.state,
            BuildState::Building { generation: g, .. } if g == generation
        )
    }

    fn record_progress(&self, generation: u64, processed: usize, total: usize) {
        let mut lifecycle = self.lifecycle.lock().unwrap();
        if let BuildState::Building {
            generation: g,
            processed: p,
            total: t,
            ..
        } = &mut lifecycle.state
        {
            if *g != generation {
                return;
            }
            *p = processed;
            *t = total;
        } else {
            return;
        }
        drop(lifecycle);

        let _ = self.event_tx.send(CatalogEvent::Progress {
            generation,
            processed,
            total,
        });
    }

    /// Building -> Ready (or back to Idle on failure). Results of builds
    /// that were invalidated are dropped.
    fn complete(&self, generation: u64, result: Result<Catalog, BuildError>, elapsed: Duration) {
        let mut lifecycle = self.lifecycle.lock().unwrap();

        if !Self::is_current(&lifecycle, generation) {
            tracing::debug!("Discarding result of stale build {}", generation);
            return;
        }

        match result {
            Ok(catalog) => {
                lifecycle.state = BuildState::Ready(catalog.clone());
                let icons = catalog.len();
                self.metrics.record_build_completed();
                self.metrics.record_icons_indexed(icons);
                self.metrics.record_build_time(elapsed);
                self.outcome_tx
                    .send_replace(Some(Outcome { generation, catalog }));
                let _ = self
                    .event_tx
                    .send(CatalogEvent::BuildFinished { generation, icons });
            }
            Err(BuildError::Cancelled) => {
                lifecycle.state = BuildState::Idle;
                self.metrics.record_build_cancelled();
            }
            Err(BuildError::Provider(e)) => {
                tracing::warn!("Icon catalog build {} failed: {}", generation, e);
                lifecycle.state = BuildState::Idle;
                self.metrics.record_build_failed();
                self.outcome_tx.send_replace(Some(Outcome {
                    generation,
                    catalog: Catalog::empty(),
                }));
                let _ = self.event_tx.send(CatalogEvent::BuildFailed {
                    generation,
                    reason: e.to_string(),
                });
            }
        }
    }
}

impl Drop for CacheInner {
    fn drop(&mut self) {
        if let Ok(lifecycle) = self.lifecycle.get_mut() {
            if let BuildState::Building { cancel_tx, .. } = &lifecycle.state {
                let _ = cancel_tx.send(true);
            }
        }
    }
}

/// Snapshot the provider off the async workers, then run the builder.
async fn run_build<F>(
    provider: Arc<dyn IconThemeProvider>,
    settings: CatalogSettings,
    metrics: Arc<CatalogMetrics>,
    cancel_rx: watch::Receiver<bool>,
    on_progress: F,
) -> Result<Catalog, BuildError>
where
    F: FnMut(usize, usize) + Send,
{
    if *cancel_rx.borrow() || cancel_rx.has_changed().is_err() {
        return Err(BuildError::Cancelled);
    }

    let builder = tokio::task::spawn_blocking(move || CatalogBuilder::capture(provider, &settings))
        .await
        .map_err(|e| ProviderError::Unavailable(format!("theme snapshot task failed: {e}")))??;

    builder.with_metrics(metrics).run(cancel_rx, on_progress).await
}
