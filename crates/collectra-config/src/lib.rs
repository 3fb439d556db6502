//! Shared configuration for collectra.
//!
//! TOML config (defaults, then file, then `COLLECTRA_` environment),
//! collection definition files in JSON or YAML, and assembly of a
//! populated `collectra_core::DataSourceManager` whose reload providers
//! re-read those files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use collectra_core::{CollectionOptions, CoreError, DEFAULT_DATA_SOURCE_KEY, DataSourceManager, DataSourceOptions};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unsupported collection file format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Key lookups without an explicit data source go to. Only `"main"`
    /// is accepted.
    #[serde(default = "default_data_source")]
    pub default_data_source: String,

    /// Seconds between background reloads; 0 disables them.
    #[serde(default)]
    pub reload_interval_secs: u64,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named data sources and their collection files.
    #[serde(default)]
    pub data_sources: BTreeMap<String, DataSourceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_data_source: default_data_source(),
            reload_interval_secs: 0,
            defaults: Defaults::default(),
            data_sources: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_data_source() -> String {
    DEFAULT_DATA_SOURCE_KEY.into()
}
fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// One data source entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DataSourceConfig {
    pub display_name: Option<String>,

    /// Collection definition files, relative to the config file.
    #[serde(default)]
    pub collections: Vec<PathBuf>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_data_source != DEFAULT_DATA_SOURCE_KEY {
            return Err(ConfigError::Validation {
                field: "default_data_source".into(),
                reason: format!(
                    "the default data source is always '{DEFAULT_DATA_SOURCE_KEY}', got '{}'",
                    self.default_data_source
                ),
            });
        }
        if let Some(key) = self.data_sources.keys().find(|key| key.trim().is_empty()) {
            return Err(ConfigError::Validation {
                field: "data_sources".into(),
                reason: format!("empty data source key '{key}'"),
            });
        }
        Ok(())
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "collectra", "collectra").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("collectra");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the Config from `path` + environment. Nested keys in the
/// environment are separated by `__` (`COLLECTRA_DEFAULTS__OUTPUT`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("COLLECTRA_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

/// Load the Config from the canonical path.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Collection files ────────────────────────────────────────────────

/// Read a JSON or YAML array of collection options, chosen by extension.
pub fn load_collections(path: &Path) -> Result<Vec<CollectionOptions>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_error = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let collections: Vec<CollectionOptions> = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text).map_err(|e| parse_error(e.to_string()))?,
        Some("yaml" | "yml") => serde_yaml::from_str(&text).map_err(|e| parse_error(e.to_string()))?,
        _ => {
            return Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };

    if let Some(index) = collections.iter().position(|c| c.name.trim().is_empty()) {
        return Err(CoreError::InvalidOptions {
            message: format!("collection #{index} in {} has no name", path.display()),
        }
        .into());
    }
    debug!(path = %path.display(), count = collections.len(), "collection file loaded");
    Ok(collections)
}

/// Resolve a configured path against the config file's directory.
pub fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn load_files(base_dir: &Path, files: &[PathBuf]) -> Result<Vec<CollectionOptions>, ConfigError> {
    let mut collections = Vec::new();
    for file in files {
        collections.extend(load_collections(&resolve_path(base_dir, file))?);
    }
    Ok(collections)
}

/// Collections of the default data source.
pub fn load_main_collections(cfg: &Config, base_dir: &Path) -> Result<Vec<CollectionOptions>, ConfigError> {
    match cfg.data_sources.get(DEFAULT_DATA_SOURCE_KEY) {
        Some(main) => load_files(base_dir, &main.collections),
        None => Ok(Vec::new()),
    }
}

/// The default data source declaration, display name included.
pub fn load_main_data_source(cfg: &Config, base_dir: &Path) -> Result<DataSourceOptions, ConfigError> {
    let mut options =
        DataSourceOptions::new(DEFAULT_DATA_SOURCE_KEY).with_collections(load_main_collections(cfg, base_dir)?);
    options.display_name = cfg
        .data_sources
        .get(DEFAULT_DATA_SOURCE_KEY)
        .and_then(|main| main.display_name.clone());
    Ok(options)
}

/// Every non-default data source with its collections.
pub fn load_data_sources(cfg: &Config, base_dir: &Path) -> Result<Vec<DataSourceOptions>, ConfigError> {
    cfg.data_sources
        .iter()
        .filter(|(key, _)| key.as_str() != DEFAULT_DATA_SOURCE_KEY)
        .map(|(key, source)| -> Result<DataSourceOptions, ConfigError> {
            let mut options = DataSourceOptions::new(key.clone())
                .with_collections(load_files(base_dir, &source.collections)?);
            options.display_name.clone_from(&source.display_name);
            Ok(options)
        })
        .collect()
}

// ── Manager assembly ────────────────────────────────────────────────

/// Build a populated manager with the built-in interfaces. Its reload
/// providers re-read the configured files.
pub fn build_manager(cfg: &Config, base_dir: &Path) -> Result<DataSourceManager, ConfigError> {
    cfg.validate()?;

    let mut builder = DataSourceManager::builder()
        .builtin_interfaces()
        .data_source(load_main_data_source(cfg, base_dir)?);
    for options in load_data_sources(cfg, base_dir)? {
        builder = builder.data_source(options);
    }
    let manager = builder.build();

    let (main_cfg, main_dir) = (cfg.clone(), base_dir.to_path_buf());
    manager.set_main_provider(move || {
        let (cfg, dir) = (main_cfg.clone(), main_dir.clone());
        async move {
            tokio::task::spawn_blocking(move || load_main_collections(&cfg, &dir))
                .await
                .map_err(|e| CoreError::provider(DEFAULT_DATA_SOURCE_KEY, e))?
                .map_err(|e| CoreError::provider(DEFAULT_DATA_SOURCE_KEY, e))
        }
    });

    let (third_cfg, third_dir) = (cfg.clone(), base_dir.to_path_buf());
    manager.set_third_party_provider(move || {
        let (cfg, dir) = (third_cfg.clone(), third_dir.clone());
        async move {
            tokio::task::spawn_blocking(move || load_data_sources(&cfg, &dir))
                .await
                .map_err(|e| CoreError::provider("data sources", e))?
                .map_err(|e| CoreError::provider("data sources", e))
        }
    });

    Ok(manager)
}
