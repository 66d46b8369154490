//! Services module - icon theme access, classification, catalog builds and filtering.
//!
//! Nothing here knows about the cache lifecycle; [`CatalogCache`](crate::state::CatalogCache)
//! drives these pieces.
//!
//! # Components
//!
//! - [`IconThemeProvider`]: capability the host theme is accessed through.
//!   [`FilesystemIconTheme`] implements it over the XDG icon directories.
//! - [`IconThemeSnapshot`]: names frozen at the start of a build, with the
//!   bundled resource root excluded.
//! - [`Classifier`]: maps a resolved icon path to a [`Category`](crate::models::Category).
//! - [`CatalogBuilder`]: processes the snapshot in fixed-size chunks and yields
//!   to the scheduler between them.
//! - [`filter()`]: category + search-text view over a finished catalog.
//!
//! # Usage Example
//!
//! ```ignore
//! use icon_catalog::services::{CatalogBuilder, FilesystemIconTheme, FilterQuery, filter};
//!
//! let provider = Arc::new(FilesystemIconTheme::from_environment(None));
//! let builder = CatalogBuilder::capture(provider, &settings)?;
//! let (_cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
//! let catalog = builder.run(cancel_rx, |_, _| {}).await?;
//!
//! let query = FilterQuery::new(Category::Apps, "fire");
//! for record in filter(&catalog, &query) {
//!     println!("{}", record.name);
//! }
//! ```

pub mod builder;
pub mod classifier;
pub mod filter;
pub mod theme;

pub use builder::{BuildError, BuildProgress, CatalogBuilder, NameCollator, sort_records};
pub use classifier::{Classifier, bundled_category, classify};
pub use filter::{FilterQuery, filter, matches};
pub use theme::{
    BundledEntry, FilesystemIconTheme, IconHandle, IconIndex, IconThemeProvider, IconThemeSnapshot,
    ProviderError, icon_base_directories,
};
