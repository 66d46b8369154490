//! Icon-theme access: the provider capability, the frozen snapshot a build
//! reads from, and a provider backed by the XDG icon directories.

use crate::models::CatalogSettings;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// File extensions the filesystem provider treats as icons.
const ICON_EXTENSIONS: [&str; 4] = ["png", "svg", "xpm", "webp"];

/// Errors raised by an icon-theme provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Icon theme provider unavailable: {0}")]
    Unavailable(String),

    #[error("Icon {0} not found in theme")]
    IconNotFound(String),

    #[error("Failed to look up icon {name}: {reason}")]
    Lookup { name: String, reason: String },

    #[error("Failed to enumerate resource {path}: {reason}")]
    Resource { path: String, reason: String },
}

/// A resolved icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconHandle {
    /// File path or URI of the resolved icon, used for classification.
    pub path: String,
}

impl IconHandle {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// The host desktop's icon theme, injected into the catalog.
#[cfg_attr(test, mockall::automock)]
pub trait IconThemeProvider: Send + Sync {
    /// Resource roots currently registered with the theme.
    fn resource_roots(&self) -> Vec<String>;

    /// Enumerate the icons visible when the theme is restricted to
    /// `resource_roots` and freeze them into an index.
    ///
    /// Each call returns its own index, so concurrent or overlapping scans
    /// never see each other's results.
    fn scan(&self, resource_roots: &[String]) -> Result<Box<dyn IconIndex>, ProviderError>;

    /// List the entry names of a directory inside a resource root.
    fn enumerate_resource(&self, path: &str) -> Result<Vec<String>, ProviderError>;
}

/// Frozen result of one [`IconThemeProvider::scan`].
#[cfg_attr(test, mockall::automock)]
pub trait IconIndex: Send + Sync {
    /// Every icon name in the scan, in provider order.
    fn names(&self) -> Vec<String>;

    /// Resolve `name` at the requested pixel size.
    fn lookup_icon(&self, name: &str, size: u32) -> Result<IconHandle, ProviderError>;
}

/// An icon shipped inside the catalog's own resource bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundledEntry {
    pub name: String,
    pub display_icon: String,
}

/// Frozen view of the theme a single build works from.
///
/// The bundled resource root is removed from the provider's roots before the
/// names are taken, so bundled icons only enter the catalog through
/// [`bundled_entries`](Self::bundled_entries).
#[derive(Clone)]
pub struct IconThemeSnapshot {
    provider: Arc<dyn IconThemeProvider>,
    index: Arc<dyn IconIndex>,
    names: Arc<[String]>,
    icon_size: u32,
    bundled_root: String,
    bundled_icon_prefix: String,
}

impl IconThemeSnapshot {
    /// Capture the provider's current names.
    ///
    /// # Errors
    /// Returns [`ProviderError::Unavailable`] (or whatever the provider
    /// reports) when the names cannot be enumerated at all.
    pub fn capture(
        provider: Arc<dyn IconThemeProvider>,
        settings: &CatalogSettings,
    ) -> Result<Self, ProviderError> {
        let bundled_root = normalize_root(&settings.bundled_resource_root).to_string();

        let roots: Vec<String> = provider
            .resource_roots()
            .into_iter()
            .filter(|root| normalize_root(root) != bundled_root)
            .collect();

        let index: Arc<dyn IconIndex> = Arc::from(provider.scan(&roots)?);
        let raw_names = index.names();
        let total = raw_names.len();

        let mut seen = std::collections::HashSet::with_capacity(total);
        let names: Vec<String> = raw_names
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .collect();

        if names.len() != total {
            tracing::debug!("Dropped {} duplicate icon names", total - names.len());
        }

        tracing::debug!(
            "Captured icon theme snapshot: {} names from {} roots",
            names.len(),
            roots.len()
        );

        Ok(Self {
            provider,
            index,
            names: names.into(),
            icon_size: settings.icon_size,
            bundled_root,
            bundled_icon_prefix: settings.bundled_icon_prefix.trim_end_matches('/').to_string(),
        })
    }

    /// Icon names in provider order, without duplicates.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Resolve a single name.
    pub fn resolve(&self, name: &str) -> Result<IconHandle, ProviderError> {
        self.index.lookup_icon(name, self.icon_size)
    }

    /// Icons shipped in `<bundled root>/scalable/actions`.
    ///
    /// A missing or unreadable bundle is logged and yields no entries.
    pub fn bundled_entries(&self) -> Vec<BundledEntry> {
        let actions_dir = format!("{}/scalable/actions", self.bundled_root);

        let entries = match self.provider.enumerate_resource(&actions_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("No bundled action icons found in {}: {}", actions_dir, e);
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .filter_map(|entry| {
                let name = entry.strip_suffix(".svg")?.to_string();
                Some(BundledEntry {
                    display_icon: format!("{}/actions/{}", self.bundled_icon_prefix, entry),
                    name,
                })
            })
            .collect()
    }
}

fn normalize_root(root: &str) -> &str {
    let trimmed = root.trim_end_matches('/');
    if trimmed.is_empty() { root } else { trimmed }
}

/// Icon theme read straight from the XDG icon directories.
///
/// Each root directory is one resource root. Roots are kept as native paths,
/// so directories whose names are not valid UTF-8 are still scanned; they are
/// reported through [`resource_roots`](IconThemeProvider::resource_roots) in
/// lossy form and matched back to the native path on [`scan`](IconThemeProvider::scan).
pub struct FilesystemIconTheme {
    roots: Vec<PathBuf>,
}

impl FilesystemIconTheme {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        for root in roots.iter().filter(|r| r.to_str().is_none()) {
            tracing::debug!("Icon root is not valid UTF-8: {}", root.display());
        }
        Self { roots }
    }

    /// Provider over the standard XDG, Flatpak and Snap icon directories,
    /// plus the application's own bundle when given.
    pub fn from_environment(bundled_root: Option<&str>) -> Self {
        let mut roots = icon_base_directories();
        if let Some(root) = bundled_root {
            roots.push(PathBuf::from(root));
        }
        Self::new(roots)
    }

    /// Walk `roots`, skipping any other configured root nested inside them.
    fn index_roots(&self, roots: &[&PathBuf]) -> FileIconIndex {
        let excluded: Vec<&PathBuf> = self.roots.iter().filter(|r| !roots.contains(r)).collect();
        let mut paths: HashMap<String, Vec<PathBuf>> = HashMap::new();
        let mut names = Vec::new();

        for root in roots {
            let walker = walkdir::WalkDir::new(root)
                .follow_links(true)
                .max_depth(10)
                .into_iter()
                .filter_entry(|e| !excluded.iter().any(|x| e.path() == x.as_path()));

            for entry in walker.filter_map(|e| e.ok()) {
                if entry.file_type().is_dir() {
                    continue;
                }

                let path = entry.path();
                let is_icon = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| ICON_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
                if !is_icon {
                    continue;
                }

                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };

                let candidates = paths.entry(stem.to_string()).or_default();
                if candidates.is_empty() {
                    names.push(stem.to_string());
                }
                candidates.push(path.to_path_buf());
            }
        }

        FileIconIndex { names, paths }
    }
}

impl IconThemeProvider for FilesystemIconTheme {
    fn resource_roots(&self) -> Vec<String> {
        self.roots
            .iter()
            .map(|r| r.to_string_lossy().into_owned())
            .collect()
    }

    fn scan(&self, resource_roots: &[String]) -> Result<Box<dyn IconIndex>, ProviderError> {
        let roots: Vec<&PathBuf> = self
            .roots
            .iter()
            .filter(|r| resource_roots.iter().any(|req| *req == r.to_string_lossy()))
            .filter(|r| r.is_dir())
            .collect();

        if roots.is_empty() {
            return Err(ProviderError::Unavailable(
                "no icon directory exists on this system".to_string(),
            ));
        }

        tracing::debug!("Scanning {} icon directories...", roots.len());
        Ok(Box::new(self.index_roots(&roots)))
    }

    fn enumerate_resource(&self, path: &str) -> Result<Vec<String>, ProviderError> {
        let resource_error = |e: std::io::Error| ProviderError::Resource {
            path: path.to_string(),
            reason: e.to_string(),
        };

        let mut entries = Vec::new();
        for entry in fs::read_dir(Path::new(path)).map_err(resource_error)? {
            let entry = entry.map_err(resource_error)?;
            if let Some(name) = entry.file_name().to_str() {
                entries.push(name.to_string());
            }
        }
        entries.sort();
        Ok(entries)
    }
}

/// Icon name -> candidate files, in discovery order.
struct FileIconIndex {
    names: Vec<String>,
    paths: HashMap<String, Vec<PathBuf>>,
}

impl IconIndex for FileIconIndex {
    fn names(&self) -> Vec<String> {
        self.names.clone()
    }

    /// Prefers a candidate under a `<size>x<size>` directory, else the first found.
    fn lookup_icon(&self, name: &str, size: u32) -> Result<IconHandle, ProviderError> {
        let candidates = self
            .paths
            .get(name)
            .ok_or_else(|| ProviderError::IconNotFound(name.to_string()))?;

        let sized = format!("{size}x{size}");
        let chosen = candidates
            .iter()
            .find(|p| p.components().any(|c| c.as_os_str() == sized.as_str()))
            .or_else(|| candidates.first())
            .ok_or_else(|| ProviderError::IconNotFound(name.to_string()))?;

        Ok(IconHandle::new(chosen.to_string_lossy()))
    }
}

/// Base icon directories (XDG + Flatpak + Snap).
pub fn icon_base_directories() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let home = std::env::var("HOME").unwrap_or_default();

    let xdg_data_home =
        std::env::var("XDG_DATA_HOME").unwrap_or_else(|_| format!("{}/.local/share", home));
    let xdg_data_dirs = std::env::var("XDG_DATA_DIRS")
        .unwrap_or_else(|_| "/usr/local/share:/usr/share".to_string());

    dirs.push(PathBuf::from(&xdg_data_home).join("icons"));
    dirs.push(PathBuf::from(&home).join(".icons"));

    for data_dir in xdg_data_dirs.split(':').filter(|d| !d.is_empty()) {
        dirs.push(PathBuf::from(data_dir).join("icons"));
        dirs.push(PathBuf::from(data_dir).join("pixmaps"));
    }

    dirs.push(PathBuf::from("/usr/share/pixmaps"));
    dirs.push(PathBuf::from("/var/lib/flatpak/exports/share/icons"));
    dirs.push(PathBuf::from(&home).join(".local/share/flatpak/exports/share/icons"));
    dirs.push(PathBuf::from("/var/lib/snapd/desktop/icons"));

    let mut seen = std::collections::HashSet::new();
    dirs.retain(|d| seen.insert(d.clone()));
    dirs
}
