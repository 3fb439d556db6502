//! Clap derive structures for the `collectra` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// collectra -- inspect collection and data source registries
#[derive(Debug, Parser)]
#[command(
    name = "collectra",
    version,
    about = "Inspect collection and data source registries from the command line",
    long_about = "Builds a collection registry from the configured data sources and\n\
        collection definition files, then lists, resolves and reloads it.\n\n\
        Dotted paths such as 'users.roles' or 'users.roles.name' follow\n\
        association fields across collections and data sources.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "COLLECTRA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format (defaults to `defaults.output` from the config)
    #[arg(long, short = 'o', env = "COLLECTRA_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output (defaults to `defaults.color` from the config)
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

impl GlobalOpts {
    /// The effective output format; `table` until the config is applied.
    pub fn format(&self) -> &OutputFormat {
        self.output.as_ref().unwrap_or(&OutputFormat::Table)
    }

    /// Whether to emit color codes; `auto` until the config is applied.
    pub fn color_enabled(&self) -> bool {
        crate::output::should_color(self.color.as_ref().unwrap_or(&ColorMode::Auto))
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List and inspect collections
    #[command(alias = "col", alias = "c")]
    Collections(CollectionsArgs),

    /// Resolve a dotted field path ("users.roles" or "users.roles.name")
    #[command(alias = "f")]
    Field(FieldArgs),

    /// List registered field interfaces and their groups
    #[command(alias = "if")]
    Interfaces(InterfacesArgs),

    /// List registered collection templates
    Templates,

    /// List data sources
    #[command(alias = "ds")]
    DataSources,

    /// Re-read collection definitions through the configured providers
    Reload(ReloadArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ────────────────────────────────────────────────

/// Data source selection shared by lookup commands.
#[derive(Debug, Args)]
pub struct DataSourceArg {
    /// Data source key (defaults to "main")
    #[arg(long = "data-source", short = 'd')]
    pub key: Option<String>,
}

impl DataSourceArg {
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COLLECTIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CollectionsArgs {
    #[command(subcommand)]
    pub command: CollectionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum CollectionsCommand {
    /// List collections of a data source
    #[command(alias = "ls")]
    List(CollectionListArgs),

    /// Show one collection (a dotted path resolves the association target)
    Get {
        /// Collection name or dotted association path
        target: String,

        #[command(flatten)]
        data_source: DataSourceArg,
    },

    /// List the fields of a collection
    Fields {
        /// Collection name or dotted association path
        target: String,

        /// Include fields inherited from parent collections
        #[arg(long, short = 'i')]
        inherited: bool,

        #[command(flatten)]
        data_source: DataSourceArg,
    },

    /// Show the inheritance chain of a collection, nearest parent first
    Inherits {
        /// Collection name
        name: String,

        #[command(flatten)]
        data_source: DataSourceArg,
    },
}

/// Filtering and pagination for `collections list`.
#[derive(Debug, Args)]
pub struct CollectionListArgs {
    #[command(flatten)]
    pub data_source: DataSourceArg,

    /// Only collections whose name contains this text
    #[arg(long)]
    pub name: Option<String>,

    /// Only collections whose title contains this text
    #[arg(long)]
    pub title: Option<String>,

    /// Only hidden (true) or visible (false) collections
    #[arg(long)]
    pub hidden: Option<bool>,

    /// Page number, starting at 1
    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Rows per page
    #[arg(long, short = 'l', default_value = "20")]
    pub page_size: usize,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  FIELD
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct FieldArgs {
    /// Dotted path: collection.field[.field...]
    pub path: String,

    #[command(flatten)]
    pub data_source: DataSourceArg,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  INTERFACES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct InterfacesArgs {
    #[command(subcommand)]
    pub command: InterfacesCommand,
}

#[derive(Debug, Subcommand)]
pub enum InterfacesCommand {
    /// List field interfaces
    #[command(alias = "ls")]
    List {
        /// Only interfaces of this group
        #[arg(long, short = 'g')]
        group: Option<String>,
    },

    /// Show one field interface with its defaults and filter operators
    Get {
        /// Interface name
        name: String,
    },

    /// List interface groups in display order
    Groups,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RELOAD
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ReloadArgs {
    /// Which data sources to reload
    #[arg(long, short = 's', default_value = "all")]
    pub scope: ReloadScope,

    /// Keep reloading everything every `reload_interval_secs` until Ctrl-C
    #[arg(long, short = 'w', conflicts_with = "scope")]
    pub watch: bool,

    /// Override `reload_interval_secs` for --watch
    #[arg(long, requires = "watch")]
    pub interval: Option<u64>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ReloadScope {
    /// The default data source only
    Main,
    /// Every other data source
    ThirdParty,
    /// Both
    All,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG / COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a starter config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
