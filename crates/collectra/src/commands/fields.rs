//! Field path resolution and field listings.

use std::sync::Arc;

use collectra_core::{CollectionField, DataSourceManager};
use tabled::Tabled;

use crate::cli::{FieldArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    field_type: String,
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Collection")]
    collection: String,
}

impl From<&Arc<CollectionField>> for FieldRow {
    fn from(f: &Arc<CollectionField>) -> Self {
        let target = match (f.target(), f.target_data_source()) {
            (Some(target), Some(source)) => format!("{source}:{target}"),
            (target, _) => util::or_dash(target),
        };
        Self {
            name: f.name().to_owned(),
            field_type: util::or_dash(f.field_type()),
            interface: util::or_dash(f.interface()),
            target,
            collection: util::or_dash(f.collection_name()),
        }
    }
}

fn detail(f: &Arc<CollectionField>, color: bool) -> String {
    let l = |text: &str| output::label(text, color);
    let mut lines = vec![
        format!("{} {}", l("Name:       "), f.name()),
        format!("{} {}", l("Collection: "), util::or_dash(f.collection_name())),
        format!("{} {}", l("Type:       "), util::or_dash(f.field_type())),
        format!("{} {}", l("Interface:  "), util::or_dash(f.interface())),
    ];
    if let Some(kind) = f.association_kind() {
        lines.push(format!("{} {kind}", l("Association:")));
    }
    if let Some(target) = f.target() {
        lines.push(format!("{} {target}", l("Target:     ")));
    }
    if let Some(source) = f.target_data_source() {
        lines.push(format!("{} {source}", l("Target DS:  ")));
    }
    if let Some(key) = f.foreign_key() {
        lines.push(format!("{} {key}", l("Foreign key:")));
    }
    if let Some(title) = f.ui_schema().and_then(|s| s.get("title")).and_then(|t| t.as_str()) {
        lines.push(format!("{} {title}", l("UI title:   ")));
    }
    lines.join("\n")
}

// ── Handlers ────────────────────────────────────────────────────────

pub fn handle(manager: &DataSourceManager, args: &FieldArgs, global: &GlobalOpts) -> Result<(), CliError> {
    manager.resolve_data_source(args.data_source.key())?;
    if !args.path.contains('.') {
        return Err(CliError::Validation {
            field: "path".into(),
            reason: format!("'{}' has no field part, expected collection.field", args.path),
        });
    }

    let field = manager
        .get_collection_field(&args.path, args.data_source.key())
        .ok_or_else(|| CliError::not_found("field", args.path.as_str(), "collections list"))?;

    let color = global.color_enabled();
    let out = output::render_single(
        global.format(),
        field.options(),
        |_| detail(&field, color),
        |options| options.name.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Render a field list in the selected format.
pub fn print_fields(fields: &[Arc<CollectionField>], global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_list(global.format(), fields, |f| FieldRow::from(f), |f| f.name().to_owned())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
