//! Command dispatch: bridges CLI args -> registry lookups -> output formatting.

pub mod collections;
pub mod config_cmd;
pub mod data_sources;
pub mod fields;
pub mod interfaces;
pub mod reload;
pub mod templates;
pub mod util;

use collectra_core::DataSourceManager;

use crate::cli::{Command, GlobalOpts};
use crate::config::Config;
use crate::error::CliError;

/// Dispatch a registry-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    manager: &DataSourceManager,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Collections(args) => collections::handle(manager, args, global),
        Command::Field(args) => fields::handle(manager, &args, global),
        Command::Interfaces(args) => interfaces::handle(manager, args, global),
        Command::Templates => templates::handle(manager, global),
        Command::DataSources => data_sources::handle(manager, global),
        Command::Reload(args) => reload::handle(manager, cfg, &args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
