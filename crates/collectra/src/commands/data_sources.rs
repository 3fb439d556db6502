//! Data source command handlers.

use std::sync::Arc;

use collectra_core::{DataSource, DataSourceManager};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Row ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DataSourceView {
    key: String,
    display_name: String,
    status: Option<String>,
    collections: usize,
    last_reload: Option<String>,
}

impl From<&Arc<DataSource>> for DataSourceView {
    fn from(source: &Arc<DataSource>) -> Self {
        let collections = source.collection_manager();
        Self {
            key: source.key().to_owned(),
            display_name: source.display_name(),
            status: source.status(),
            collections: collections.len(),
            last_reload: collections.last_reload().map(|at| at.to_rfc3339()),
        }
    }
}

#[derive(Tabled)]
struct DataSourceRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Name")]
    display_name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Collections")]
    collections: usize,
    #[tabled(rename = "Last reload")]
    last_reload: String,
}

impl From<&DataSourceView> for DataSourceRow {
    fn from(v: &DataSourceView) -> Self {
        Self {
            key: v.key.clone(),
            display_name: v.display_name.clone(),
            status: util::or_dash(v.status.as_deref()),
            collections: v.collections,
            last_reload: util::or_dash(v.last_reload.as_deref()),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(manager: &DataSourceManager, global: &GlobalOpts) -> Result<(), CliError> {
    let sources: Vec<DataSourceView> = manager.get_data_sources().iter().map(DataSourceView::from).collect();
    let out = output::render_list(global.format(), &sources, |v| DataSourceRow::from(v), |v| v.key.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
