//! Integration tests for CatalogCache
//!
//! These tests verify that the cache:
//! - Builds at most once per lifecycle and shares the result
//! - Joins concurrent callers onto the build in flight
//! - Discards partial results when invalidated mid-build
//! - Degrades to an empty catalog when the theme is unavailable
//! - Emits lifecycle events

mod common;

use common::{BUNDLED_ICONS, FakeTheme, settings};
use icon_catalog::{BuildStatus, CatalogCache, CatalogEvent, Category};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::time::{Duration, timeout};
use tokio_test::{assert_pending, task};

async fn wait_until_mid_build(cache: &CatalogCache) {
    timeout(Duration::from_secs(10), async {
        loop {
            if let BuildStatus::Building { processed, .. } = cache.status() {
                if processed > 0 {
                    return;
                }
            }
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("Timeout waiting for build to make progress");
}

#[tokio::test]
async fn test_get_is_memoized() {
    let theme = Arc::new(FakeTheme::with_generated(50));
    let cache = CatalogCache::new(theme.clone(), settings(400));

    let first = cache.get().await;
    let second = cache.get().await;

    assert!(first.ptr_eq(&second), "Second get must return the cached catalog");
    assert_eq!(first.len(), 50 + BUNDLED_ICONS.len());
    assert_eq!(theme.name_calls(), 1);
    assert_eq!(cache.metrics().cache_hits.load(Ordering::Relaxed), 1);
    assert_eq!(cache.metrics().builds_completed.load(Ordering::Relaxed), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_gets_share_one_build() {
    let theme = Arc::new(FakeTheme::with_generated(2_000));
    let cache = CatalogCache::new(theme.clone(), settings(10));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move { cache.get().await }));
    }

    let mut catalogs = Vec::new();
    for handle in handles {
        catalogs.push(handle.await.unwrap());
    }

    assert_eq!(theme.name_calls(), 1, "Only one build may enumerate the theme");
    assert!(catalogs.iter().all(|c| c.ptr_eq(&catalogs[0])));
    assert_eq!(catalogs[0].len(), 2_000 + BUNDLED_ICONS.len());
    assert_eq!(cache.metrics().builds_started.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_invalidate_mid_build_discards_partial_results() {
    let theme = Arc::new(FakeTheme::with_generated(20_000));
    let cache = CatalogCache::new(theme.clone(), settings(1));

    let early = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.get().await })
    };

    wait_until_mid_build(&cache).await;
    cache.invalidate();

    assert_eq!(cache.status(), BuildStatus::Idle);
    assert!(cache.peek().is_none());
    assert!(!early.is_finished(), "Waiter must not receive a partial catalog");

    let rebuilt = timeout(Duration::from_secs(30), cache.get())
        .await
        .expect("Timeout waiting for rebuild");
    assert_eq!(rebuilt.len(), 20_000 + BUNDLED_ICONS.len());

    // The waiter of the cancelled build resolves with the next build.
    let early = timeout(Duration::from_secs(5), early).await.unwrap().unwrap();
    assert!(early.ptr_eq(&rebuilt));

    assert_eq!(theme.name_calls(), 2);
    assert_eq!(cache.metrics().builds_cancelled.load(Ordering::Relaxed), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_invalidate_during_snapshot_never_overlaps_scans() {
    let theme = Arc::new(FakeTheme::with_generated(20).with_scan_delay(Duration::from_millis(300)));
    let cache = CatalogCache::new(theme.clone(), settings(400));

    let early = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.get().await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    cache.invalidate();

    let rebuilt = timeout(Duration::from_secs(10), cache.get())
        .await
        .expect("Timeout waiting for rebuild");
    assert_eq!(rebuilt.len(), 20 + BUNDLED_ICONS.len());

    let early = timeout(Duration::from_secs(5), early).await.unwrap().unwrap();
    assert!(early.ptr_eq(&rebuilt));

    assert_eq!(theme.max_scans_in_flight(), 1, "Theme scans overlapped");
    assert_eq!(cache.metrics().builds_completed.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_cancelled_build_is_not_counted_as_indexed() {
    let theme = Arc::new(FakeTheme::with_generated(5_000));
    let cache = CatalogCache::new(theme.clone(), settings(1));

    let early = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.get().await })
    };
    wait_until_mid_build(&cache).await;
    cache.invalidate();

    let rebuilt = timeout(Duration::from_secs(30), cache.get())
        .await
        .expect("Timeout waiting for rebuild");
    timeout(Duration::from_secs(5), early).await.unwrap().unwrap();

    let metrics = cache.metrics();
    assert_eq!(metrics.builds_completed.load(Ordering::Relaxed), 1);
    assert_eq!(
        metrics.icons_indexed.load(Ordering::Relaxed),
        rebuilt.len() as u64
    );
}

#[tokio::test]
async fn test_invalidate_after_ready_forces_rebuild() {
    let theme = Arc::new(FakeTheme::with_generated(10));
    let cache = CatalogCache::new(theme.clone(), settings(400));

    let first = cache.get().await;
    cache.invalidate();
    assert_eq!(cache.status(), BuildStatus::Idle);

    let second = cache.get().await;

    assert!(!first.ptr_eq(&second));
    assert_eq!(first.records(), second.records());
    assert_eq!(theme.name_calls(), 2);
}

#[tokio::test]
async fn test_invalidate_when_idle_is_harmless() {
    let theme = Arc::new(FakeTheme::with_generated(3));
    let cache = CatalogCache::new(theme.clone(), settings(400));

    cache.invalidate();
    cache.invalidate();

    assert_eq!(cache.status(), BuildStatus::Idle);
    assert_eq!(cache.get().await.len(), 3 + BUNDLED_ICONS.len());
}

#[tokio::test]
async fn test_unavailable_theme_yields_empty_catalog_and_retries() {
    let theme = Arc::new(FakeTheme::with_generated(5));
    theme.set_unavailable(true);
    let cache = CatalogCache::new(theme.clone(), settings(400));

    let empty = cache.get().await;
    assert!(empty.is_empty());
    assert_eq!(cache.status(), BuildStatus::Idle, "A failed build must not be cached");

    theme.set_unavailable(false);
    let catalog = cache.get().await;

    assert_eq!(catalog.len(), 5 + BUNDLED_ICONS.len());
    assert_eq!(theme.name_calls(), 2);
    assert_eq!(cache.metrics().builds_failed.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_lifecycle_events() {
    let theme = Arc::new(FakeTheme::with_generated(25));
    let cache = CatalogCache::new(theme, settings(10));
    let mut rx = cache.subscribe();

    cache.get().await;
    cache.invalidate();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert_eq!(
        events,
        vec![
            CatalogEvent::BuildStarted { generation: 1 },
            CatalogEvent::Progress {
                generation: 1,
                processed: 10,
                total: 25
            },
            CatalogEvent::Progress {
                generation: 1,
                processed: 20,
                total: 25
            },
            CatalogEvent::BuildFinished {
                generation: 1,
                icons: 25 + BUNDLED_ICONS.len()
            },
            CatalogEvent::Invalidated,
        ]
    );
}

#[tokio::test]
async fn test_failure_event_carries_reason() {
    let theme = Arc::new(FakeTheme::with_generated(1));
    theme.set_unavailable(true);
    let cache = CatalogCache::new(theme, settings(400));
    let mut rx = cache.subscribe();

    cache.get().await;

    let _started = rx.recv().await.unwrap();
    let event = timeout(Duration::from_millis(100), rx.recv())
        .await
        .expect("Timeout waiting for event")
        .expect("Channel closed");

    match event {
        CatalogEvent::BuildFailed { generation, reason } => {
            assert_eq!(generation, 1);
            assert!(reason.contains("no default display"), "got: {reason}");
        }
        other => panic!("Expected BuildFailed, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_catalog_contents() {
    let theme = Arc::new(FakeTheme::new(
        ["text-x-rust", "firefox", "edit-copy", "folder", "loose-end"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    ));
    let cache = CatalogCache::new(theme, settings(2));

    let catalog = cache.get().await;
    let names: Vec<&str> = catalog.iter().map(|r| r.name.as_str()).collect();

    assert_eq!(
        names,
        vec![
            "custom-star",
            "distro-fedora",
            "edit-copy",
            "firefox",
            "folder",
            "loose-end",
            "text-x-rust"
        ]
    );
    assert_eq!(catalog.get("custom-star").unwrap().category, Category::Custom);
    assert_eq!(catalog.get("distro-fedora").unwrap().category, Category::Distro);
    assert_eq!(catalog.get("edit-copy").unwrap().category, Category::Actions);
    assert_eq!(catalog.get("firefox").unwrap().category, Category::Apps);
    assert_eq!(catalog.get("folder").unwrap().category, Category::Places);
    assert_eq!(catalog.get("loose-end").unwrap().category, Category::Other);
    assert_eq!(catalog.get("text-x-rust").unwrap().category, Category::Mimetypes);
    assert_eq!(
        catalog.get("distro-fedora").unwrap().display_icon,
        "resource:///opt/icon-catalog/icons/scalable/actions/distro-fedora.svg"
    );
}

#[tokio::test]
async fn test_dropping_cache_stops_build() {
    let theme = Arc::new(FakeTheme::with_generated(20_000));
    let cache = CatalogCache::new(theme.clone(), settings(1));

    let mut pending = task::spawn(cache.get());
    assert_pending!(pending.poll());
    assert!(matches!(cache.status(), BuildStatus::Building { .. }));

    drop(pending);
    drop(cache);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let lookups = theme.lookups();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(theme.lookups(), lookups, "Build kept running after teardown");
    assert!(lookups < 20_000);
}

#[tokio::test]
async fn test_shutdown_resets_to_idle() {
    let theme = Arc::new(FakeTheme::with_generated(4));
    let cache = CatalogCache::new(theme, settings(400));

    cache.get().await;
    assert_eq!(cache.status(), BuildStatus::Ready { icons: 4 + BUNDLED_ICONS.len() });

    cache.shutdown();
    assert_eq!(cache.status(), BuildStatus::Idle);
}
