//! Config subcommand handlers.

use std::path::Path;

use collectra_core::{CollectionOptions, FieldOptions};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config, DataSourceConfig};
use crate::error::CliError;
use crate::output;

const STARTER_COLLECTIONS: &str = "collections/main.json";

// ── Helpers ─────────────────────────────────────────────────────────

fn starter_config() -> Config {
    let mut cfg = Config::default();
    cfg.data_sources.insert(
        collectra_core::DEFAULT_DATA_SOURCE_KEY.into(),
        DataSourceConfig {
            display_name: Some("Main".into()),
            collections: vec![STARTER_COLLECTIONS.into()],
        },
    );
    cfg
}

fn starter_collections() -> Vec<CollectionOptions> {
    vec![
        CollectionOptions::new("users")
            .with_title("Users")
            .field(FieldOptions::new("nickname").with_interface("input"))
            .field(FieldOptions::new("roles").with_interface("m2m").with_target("roles")),
        CollectionOptions::new("roles")
            .with_title("Roles")
            .field(FieldOptions::new("title").with_interface("input")),
    ]
}

/// Write the sample collection file unless one is already there.
fn write_starter_collections(base_dir: &Path) -> Result<(), CliError> {
    let path = config::resolve_path(base_dir, Path::new(STARTER_COLLECTIONS));
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, serde_json::to_string_pretty(&starter_collections())?)?;
    Ok(())
}

fn render_toml(cfg: &Config) -> Result<String, CliError> {
    toml::to_string_pretty(cfg).map_err(|e| CliError::Validation {
        field: "config".into(),
        reason: format!("TOML serialization failed: {e}"),
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::active_config_path(global);
    match args.command {
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            config::save_config_to(&starter_config(), &path)?;
            write_starter_collections(&config::base_dir(&path))?;
            if !global.quiet {
                eprintln!("Config written to {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let out = match global.format() {
                OutputFormat::Table | OutputFormat::Plain => render_toml(&cfg)?,
                structured => output::render_single(structured, &cfg, |_| String::new(), |_| String::new())?,
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }
    }
}
