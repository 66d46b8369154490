//! Data models for the icon catalog.
//!
//! - [`Category`], [`IconRecord`] and [`Catalog`]: what a build produces
//! - [`AppConfig`], [`CatalogSettings`] and [`LogSettings`]: settings loaded by
//!   [`ConfigManager`](crate::config::ConfigManager)
//!
//! Records and catalogs are immutable once built. A [`Catalog`] is shared by
//! reference between every consumer of the [`CatalogCache`](crate::state::CatalogCache).

pub mod config;
pub mod icon;

pub use self::config::{AppConfig, CatalogSettings, LogSettings};
pub use icon::{Catalog, Category, IconRecord, UnknownCategory};
