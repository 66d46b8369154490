//! icon-catalog - list the icons of the desktop icon theme
//!
//! ```text
//! icon-catalog [CATEGORY] [SEARCH]
//! ```
//!
//! Builds the catalog once through [`CatalogCache`], prints every record that
//! passes the filter as `name<TAB>category<TAB>display_icon`, then prints the
//! per-category counts to stderr.
//!
//! Configuration is read from `$XDG_CONFIG_HOME/icon-catalog/icon-catalog.yaml`
//! (see [`ConfigManager`]) and may be overridden with `ICON_CATALOG__*`
//! environment variables.

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use icon_catalog::{
    APP_NAME, CatalogCache, Category, ConfigManager, FilesystemIconTheme, FilterQuery, VERSION,
    filter,
};
use std::io::Write;
use std::sync::Arc;

fn main() -> Result<()> {
    let config_manager = ConfigManager::new(config_directory())?;
    let config = config_manager.load_config()?;

    let _guard = icon_catalog::logging::setup_logging(&config.logging)?;
    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let mut args = std::env::args().skip(1);
    let category = match args.next() {
        Some(arg) => arg.parse::<Category>()?,
        None => Category::All,
    };
    let search_text = args.collect::<Vec<_>>().join(" ");
    let query = FilterQuery::new(category, &search_text);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("icon-catalog-worker")
        .build()
        .context("Failed to create tokio runtime")?;

    let provider = Arc::new(FilesystemIconTheme::from_environment(Some(
        config.catalog.bundled_resource_root.as_str(),
    )));
    let cache = CatalogCache::with_runtime(provider, config.catalog.clone(), runtime.handle().clone());

    let catalog = runtime.block_on(cache.get());
    tracing::info!(
        "Catalog ready: {} icons, filter category={} search={:?}",
        catalog.len(),
        query.category(),
        query.search_text()
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut shown = 0usize;
    for record in filter(&catalog, &query) {
        writeln!(out, "{}\t{}\t{}", record.name, record.category, record.display_icon)?;
        shown += 1;
    }
    out.flush()?;

    eprintln!("{shown} of {} icons", catalog.len());
    for (category, count) in catalog.category_counts() {
        eprintln!("  {:<14} {}", category.label(), count);
    }

    cache.shutdown();
    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    tracing::info!("Application shutdown complete");
    Ok(())
}

fn config_directory() -> Utf8PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|dir| !dir.is_empty())
        .map(Utf8PathBuf::from)
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_default();
            Utf8PathBuf::from(home).join(".config")
        });
    base.join(APP_NAME)
}
