// Icon Catalog - memoized catalog of desktop icon-theme icons
//
// Library crate holding the catalog model, the chunked builder and the
// single-flight cache. The binary crate (main.rs) is a small command-line
// front end.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use crate::config::ConfigManager;
pub use metrics::CatalogMetrics;
pub use models::{AppConfig, Catalog, CatalogSettings, Category, IconRecord, LogSettings};
pub use services::{FilesystemIconTheme, FilterQuery, IconThemeProvider, filter};
pub use state::{BuildStatus, CatalogCache, CatalogEvent};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
