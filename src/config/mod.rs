use crate::models::AppConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat};
use std::fs;

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "icon-catalog.yaml";

/// Prefix of environment variables that override file settings,
/// e.g. `ICON_CATALOG__CATALOG__CHUNK_SIZE=200`.
pub const ENV_PREFIX: &str = "ICON_CATALOG";

/// Configuration manager for loading and saving `icon-catalog.yaml`.
///
/// Values are layered: built-in defaults, then the YAML file (optional),
/// then `ICON_CATALOG__*` environment variables.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager rooted at `config_dir`, creating the
    /// directory if needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
        })
    }

    /// Load the configuration with environment overrides from the process environment.
    pub fn load_config(&self) -> Result<AppConfig> {
        self.load_layered(None)
    }

    /// Load the configuration using `env` in place of the process environment.
    ///
    /// Keys use the same form as real variables (`ICON_CATALOG__CATALOG__CHUNK_SIZE`).
    pub fn load_config_with_env(&self, env: config::Map<String, String>) -> Result<AppConfig> {
        self.load_layered(Some(env))
    }

    fn load_layered(&self, env: Option<config::Map<String, String>>) -> Result<AppConfig> {
        if !self.config_path.exists() {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                self.config_path
            );
        }

        let environment = Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(env);

        let layered = Config::builder()
            .add_source(File::new(self.config_path.as_str(), FileFormat::Yaml).required(false))
            .add_source(environment)
            .build()
            .with_context(|| format!("Failed to read config: {}", self.config_path))?;

        let mut config: AppConfig = layered
            .try_deserialize()
            .with_context(|| format!("Failed to parse config: {}", self.config_path))?;

        if config.catalog.chunk_size == 0 {
            tracing::warn!("chunk_size of 0 is invalid, using 1");
            config.catalog.chunk_size = 1;
        }

        tracing::info!(
            "Loaded config: chunk_size={}, icon_size={}, locale={:?}",
            config.catalog.chunk_size,
            config.catalog.icon_size,
            config.catalog.locale
        );
        Ok(config)
    }

    /// Save the configuration file.
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write config: {}", self.config_path))?;

        tracing::info!("Saved config to {}", self.config_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Get the configuration file path.
    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}
