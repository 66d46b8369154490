//! Chunked, cooperative catalog construction.

use crate::metrics::CatalogMetrics;
use crate::models::{Catalog, CatalogSettings, IconRecord};
use crate::services::classifier::{Classifier, bundled_category};
use crate::services::theme::{IconThemeProvider, IconThemeSnapshot, ProviderError};
use icu::collator::{Collator, CollatorBorrowed};
use icu::locale::Locale;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::watch;

/// Errors that end a build without a catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Catalog build cancelled")]
    Cancelled,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Outcome of one builder step.
#[derive(Debug, Clone)]
pub enum BuildProgress {
    /// More chunks remain. `processed` counts provider names handled so far.
    Pending { processed: usize, total: usize },

    /// The catalog is sorted and frozen.
    Complete(Catalog),
}

/// Builds a [`Catalog`] one chunk at a time.
///
/// The builder is a plain state machine: every [`step`](Self::step) handles
/// at most `chunk_size` provider names (the first step also collects the
/// bundled icons). [`run`](Self::run) drives it on the tokio scheduler,
/// yielding between chunks and stopping at the first chunk boundary after
/// cancellation is requested.
pub struct CatalogBuilder {
    snapshot: IconThemeSnapshot,
    classifier: Classifier,
    distro_prefix: String,
    chunk_size: usize,
    locale: Option<String>,
    metrics: Option<Arc<CatalogMetrics>>,

    cursor: usize,
    bundled_done: bool,
    accumulator: Vec<IconRecord>,
    skipped: usize,
    result: Option<Catalog>,
}

impl CatalogBuilder {
    pub fn new(snapshot: IconThemeSnapshot, settings: &CatalogSettings) -> Self {
        let capacity = snapshot.names().len();
        Self {
            snapshot,
            classifier: Classifier::new().with_scalable_category(settings.scalable_category),
            distro_prefix: settings.distro_prefix.clone(),
            chunk_size: settings.effective_chunk_size(),
            locale: settings.locale.clone(),
            metrics: None,
            cursor: 0,
            bundled_done: false,
            accumulator: Vec::with_capacity(capacity),
            skipped: 0,
            result: None,
        }
    }

    /// Snapshot the provider and prepare a builder over it.
    ///
    /// # Errors
    /// [`BuildError::Provider`] when the provider cannot enumerate its icons.
    pub fn capture(
        provider: Arc<dyn IconThemeProvider>,
        settings: &CatalogSettings,
    ) -> Result<Self, BuildError> {
        let snapshot = IconThemeSnapshot::capture(provider, settings)?;
        Ok(Self::new(snapshot, settings))
    }

    pub fn with_metrics(mut self, metrics: Arc<CatalogMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Provider names that will be processed.
    pub fn total(&self) -> usize {
        self.snapshot.names().len()
    }

    /// Provider names processed so far.
    pub fn processed(&self) -> usize {
        self.cursor
    }

    /// Names whose resolution failed and were left out.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Run one bounded unit of work.
    pub fn step(&mut self) -> BuildProgress {
        if let Some(catalog) = &self.result {
            return BuildProgress::Complete(catalog.clone());
        }

        if !self.bundled_done {
            self.collect_bundled();
            self.bundled_done = true;
        }

        let names = self.snapshot.names();
        let total = names.len();
        let end = (self.cursor + self.chunk_size).min(total);

        for name in &names[self.cursor..end] {
            match self.snapshot.resolve(name) {
                Ok(handle) => {
                    let category = self.classifier.classify(&handle.path);
                    self.accumulator
                        .push(IconRecord::new(name.as_str(), name.as_str(), category));
                }
                Err(e) => {
                    tracing::debug!("Skipping icon {}: {}", name, e);
                    self.skipped += 1;
                    if let Some(metrics) = &self.metrics {
                        metrics.record_item_skipped();
                    }
                }
            }
        }

        self.cursor = end;
        if let Some(metrics) = &self.metrics {
            metrics.record_chunk_processed();
        }

        if self.cursor < total {
            tracing::debug!("Processed {}/{} theme icons", self.cursor, total);
            return BuildProgress::Pending {
                processed: self.cursor,
                total,
            };
        }

        let mut records = std::mem::take(&mut self.accumulator);
        sort_records(&mut records, self.locale.as_deref());
        let catalog = Catalog::from_sorted(records);
        self.result = Some(catalog.clone());

        BuildProgress::Complete(catalog)
    }

    fn collect_bundled(&mut self) {
        let entries = self.snapshot.bundled_entries();
        tracing::debug!("Collected {} bundled icons", entries.len());

        for entry in entries {
            let category = bundled_category(&entry.name, &self.distro_prefix);
            self.accumulator
                .push(IconRecord::new(entry.name, entry.display_icon, category));
        }
    }

    /// Drive the builder to completion, yielding to the scheduler between
    /// chunks.
    ///
    /// `cancel` is checked before every chunk; a `true` value or a dropped
    /// sender ends the build with [`BuildError::Cancelled`] and discards the
    /// partial accumulator. `on_progress` is called after every pending step.
    pub async fn run<F>(
        mut self,
        cancel: watch::Receiver<bool>,
        mut on_progress: F,
    ) -> Result<Catalog, BuildError>
    where
        F: FnMut(usize, usize) + Send,
    {
        let start = Instant::now();
        tracing::info!(
            "Building icon catalog: {} theme icons in chunks of {}",
            self.total(),
            self.chunk_size
        );

        loop {
            if *cancel.borrow() || cancel.has_changed().is_err() {
                tracing::info!(
                    "Icon catalog build cancelled after {}/{} icons",
                    self.cursor,
                    self.total()
                );
                return Err(BuildError::Cancelled);
            }

            match self.step() {
                BuildProgress::Pending { processed, total } => {
                    on_progress(processed, total);
                    tokio::task::yield_now().await;
                }
                BuildProgress::Complete(catalog) => {
                    let elapsed = start.elapsed();
                    self.finish(&catalog, elapsed);
                    return Ok(catalog);
                }
            }
        }
    }

    fn finish(&self, catalog: &Catalog, elapsed: Duration) {
        tracing::info!(
            "Built icon catalog in {}ms: {} icons ({} skipped)",
            elapsed.as_millis(),
            catalog.len(),
            self.skipped
        );
    }
}

/// Locale-aware name ordering.
///
/// Falls back to case-insensitive comparison when no collation data is
/// available for the locale.
pub struct NameCollator {
    collator: Option<CollatorBorrowed<'static>>,
}

impl NameCollator {
    /// Collator for `locale`, the system locale when `None`, `en-US` when
    /// neither parses.
    pub fn new(locale: Option<&str>) -> Self {
        let locale = collation_locale(locale);
        let collator = match Collator::try_new(locale.clone().into(), Default::default()) {
            Ok(collator) => Some(collator),
            Err(e) => {
                tracing::warn!("No collation data for {}: {}", locale, e);
                None
            }
        };

        Self { collator }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let primary = match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => a.to_lowercase().cmp(&b.to_lowercase()),
        };
        primary.then_with(|| a.cmp(b))
    }
}

fn collation_locale(requested: Option<&str>) -> Locale {
    requested
        .map(str::to_string)
        .or_else(sys_locale::get_locale)
        .and_then(|tag| tag.parse::<Locale>().ok())
        .unwrap_or_else(|| icu::locale::locale!("en-US"))
}

/// Sort records by name for `locale`.
pub fn sort_records(records: &mut [IconRecord], locale: Option<&str>) {
    let collator = NameCollator::new(locale);
    records.sort_by(|a, b| collator.compare(&a.name, &b.name));
}
