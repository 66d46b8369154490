//! In-memory icon theme shared by the integration tests.

#![allow(dead_code)]

use icon_catalog::CatalogSettings;
use icon_catalog::services::{IconHandle, IconIndex, IconThemeProvider, ProviderError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub const THEME_ROOT: &str = "/usr/share/icons";
pub const BUNDLE_ROOT: &str = "/opt/icon-catalog/icons";
pub const BUNDLED_ICONS: [&str; 2] = ["distro-fedora.svg", "custom-star.svg"];

/// Theme with a fixed name list that counts how often it is scanned.
pub struct FakeTheme {
    names: Vec<String>,
    scan_delay: Duration,
    pub name_calls: AtomicUsize,
    pub lookups: Arc<AtomicUsize>,
    pub unavailable: AtomicBool,
    scans_in_flight: AtomicUsize,
    max_scans_in_flight: AtomicUsize,
}

impl FakeTheme {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            scan_delay: Duration::ZERO,
            name_calls: AtomicUsize::new(0),
            lookups: Arc::new(AtomicUsize::new(0)),
            unavailable: AtomicBool::new(false),
            scans_in_flight: AtomicUsize::new(0),
            max_scans_in_flight: AtomicUsize::new(0),
        }
    }

    /// `count` generated names, `icon-00000` upwards.
    pub fn with_generated(count: usize) -> Self {
        Self::new((0..count).map(|i| format!("icon-{i:05}")).collect())
    }

    /// Every scan blocks its thread for `delay`.
    pub fn with_scan_delay(mut self, delay: Duration) -> Self {
        self.scan_delay = delay;
        self
    }

    pub fn name_calls(&self) -> usize {
        self.name_calls.load(Ordering::SeqCst)
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Highest number of scans that were running at the same time.
    pub fn max_scans_in_flight(&self) -> usize {
        self.max_scans_in_flight.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl IconThemeProvider for FakeTheme {
    fn resource_roots(&self) -> Vec<String> {
        vec![THEME_ROOT.to_string(), BUNDLE_ROOT.to_string()]
    }

    fn scan(&self, resource_roots: &[String]) -> Result<Box<dyn IconIndex>, ProviderError> {
        self.name_calls.fetch_add(1, Ordering::SeqCst);
        assert!(
            !resource_roots.iter().any(|r| r == BUNDLE_ROOT),
            "bundled root must be excluded from enumeration"
        );

        let running = self.scans_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_scans_in_flight.fetch_max(running, Ordering::SeqCst);
        if !self.scan_delay.is_zero() {
            std::thread::sleep(self.scan_delay);
        }
        self.scans_in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("no default display".to_string()));
        }
        Ok(Box::new(FakeIndex {
            names: self.names.clone(),
            lookups: Arc::clone(&self.lookups),
        }))
    }

    fn enumerate_resource(&self, path: &str) -> Result<Vec<String>, ProviderError> {
        if path == format!("{BUNDLE_ROOT}/scalable/actions") {
            Ok(BUNDLED_ICONS.iter().map(|s| s.to_string()).collect())
        } else {
            Err(ProviderError::Resource {
                path: path.to_string(),
                reason: "not a bundled directory".to_string(),
            })
        }
    }
}

/// Index handed out by [`FakeTheme::scan`]; lookups count against the theme.
struct FakeIndex {
    names: Vec<String>,
    lookups: Arc<AtomicUsize>,
}

impl IconIndex for FakeIndex {
    fn names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn lookup_icon(&self, name: &str, size: u32) -> Result<IconHandle, ProviderError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let dir = match name {
            n if n.starts_with("edit-") => "actions",
            n if n.starts_with("folder") => "places",
            n if n.starts_with("text-") => "mimetypes",
            n if n.starts_with("loose-") => "misc",
            _ => "apps",
        };
        Ok(IconHandle::new(format!(
            "{THEME_ROOT}/hicolor/{size}x{size}/{dir}/{name}.png"
        )))
    }
}

pub fn settings(chunk_size: usize) -> CatalogSettings {
    CatalogSettings {
        chunk_size,
        bundled_resource_root: BUNDLE_ROOT.to_string(),
        bundled_icon_prefix: "resource:///opt/icon-catalog/icons/scalable".to_string(),
        locale: Some("en-US".to_string()),
        ..CatalogSettings::default()
    }
}
