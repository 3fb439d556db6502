//! CLI configuration: thin wrapper around `collectra_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` overrides (--config, --output, --color).

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use tracing::warn;

use collectra_core::DataSourceManager;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use collectra_config::{
    Config, DataSourceConfig, config_path, load_config_from, resolve_path, save_config_to,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// The config file in effect: `--config` / `COLLECTRA_CONFIG`, else the
/// platform path.
pub fn active_config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Directory relative collection paths resolve against.
pub fn base_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Load the active config. A missing file yields the defaults.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config_from(&active_config_path(global))?)
}

/// Fill `--output` / `--color` from the config when not given on the
/// command line.
pub fn apply_defaults(global: &mut GlobalOpts, cfg: &Config) {
    if global.output.is_none() {
        global.output = parse_setting::<OutputFormat>("defaults.output", &cfg.defaults.output);
    }
    if global.color.is_none() {
        global.color = parse_setting::<ColorMode>("defaults.color", &cfg.defaults.color);
    }
}

fn parse_setting<T: ValueEnum>(key: &str, value: &str) -> Option<T> {
    let parsed = T::from_str(value, true).ok();
    if parsed.is_none() {
        warn!(key, value, "unrecognized config value ignored");
    }
    parsed
}

/// Build the registry described by `cfg`.
pub fn build_manager(global: &GlobalOpts, cfg: &Config) -> Result<DataSourceManager, CliError> {
    let path = active_config_path(global);
    Ok(collectra_config::build_manager(cfg, &base_dir(&path))?)
}
