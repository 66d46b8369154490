use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Top-level configuration loaded from `icon-catalog.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub catalog: CatalogSettings,

    #[serde(default)]
    pub logging: LogSettings,
}

/// Tunables for catalog builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Provider names processed per cooperative step.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Pixel size requested when resolving icons.
    #[serde(default = "default_icon_size")]
    pub icon_size: u32,

    /// Resource root holding the icons shipped with the application.
    /// Excluded from theme enumeration.
    #[serde(default = "default_bundled_resource_root")]
    pub bundled_resource_root: String,

    /// Prefix of the `display_icon` value of bundled icons.
    #[serde(default = "default_bundled_icon_prefix")]
    pub bundled_icon_prefix: String,

    /// Bundled icons whose name starts with this token are distro logos.
    #[serde(default = "default_distro_prefix")]
    pub distro_prefix: String,

    /// Classify paths whose only token is `scalable` as `Scalable` instead of `Other`.
    #[serde(default)]
    pub scalable_category: bool,

    /// BCP-47 tag used for collation. System locale when unset.
    #[serde(default)]
    pub locale: Option<String>,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            icon_size: default_icon_size(),
            bundled_resource_root: default_bundled_resource_root(),
            bundled_icon_prefix: default_bundled_icon_prefix(),
            distro_prefix: default_distro_prefix(),
            scalable_category: false,
            locale: None,
        }
    }
}

impl CatalogSettings {
    /// Chunk size with the lower bound applied.
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }
}

fn default_chunk_size() -> usize {
    400
}

fn default_icon_size() -> u32 {
    48
}

fn default_bundled_resource_root() -> String {
    "/usr/share/icon-catalog/icons".to_string()
}

fn default_bundled_icon_prefix() -> String {
    "/usr/share/icon-catalog/icons/scalable".to_string()
}

fn default_distro_prefix() -> String {
    "distro".to_string()
}

/// Logging output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_log_directory")]
    pub directory: Utf8PathBuf,

    #[serde(default = "default_log_prefix")]
    pub file_prefix: String,

    #[serde(default)]
    pub debug: bool,

    /// Mirror log output to stderr.
    #[serde(default = "default_console")]
    pub console: bool,

    /// Write the log file as JSON lines.
    #[serde(default)]
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            file_prefix: default_log_prefix(),
            debug: false,
            console: default_console(),
            json: false,
        }
    }
}

fn default_log_directory() -> Utf8PathBuf {
    log_directory_from(
        std::env::var("XDG_STATE_HOME").ok(),
        std::env::var("HOME").ok(),
    )
}

/// `$XDG_STATE_HOME/icon-catalog/logs`, or `~/.local/state/icon-catalog/logs`
/// when the variable is unset or empty.
fn log_directory_from(xdg_state_home: Option<String>, home: Option<String>) -> Utf8PathBuf {
    let state_home = xdg_state_home
        .filter(|dir| !dir.is_empty())
        .map(Utf8PathBuf::from)
        .unwrap_or_else(|| Utf8PathBuf::from(home.unwrap_or_default()).join(".local/state"));
    state_home.join("icon-catalog").join("logs")
}

fn default_log_prefix() -> String {
    "icon-catalog".to_string()
}

fn default_console() -> bool {
    true
}
