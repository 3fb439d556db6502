//! Collection command handlers.

use std::sync::Arc;

use collectra_core::{Collection, CollectionField, CollectionRepository, CollectionRow, DataSourceManager, Filter};
use tabled::Tabled;

use crate::cli::{CollectionListArgs, CollectionsArgs, CollectionsCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::{fields, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct CollectionTableRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Template")]
    template: String,
    #[tabled(rename = "Inherits")]
    inherits: String,
    #[tabled(rename = "Fields")]
    fields: usize,
    #[tabled(rename = "Hidden")]
    hidden: String,
}

impl From<&CollectionRow> for CollectionTableRow {
    fn from(row: &CollectionRow) -> Self {
        Self {
            name: row.name.clone(),
            title: util::or_dash(row.title.as_deref()),
            template: util::or_dash(row.template.as_deref()),
            inherits: util::join_or_dash(&row.inherits),
            fields: row.fields.len(),
            hidden: util::yes_no(row.hidden),
        }
    }
}

fn detail(collection: &Arc<Collection>, color: bool) -> String {
    let l = |text: &str| output::label(text, color);
    [
        format!("{} {}", l("Name:       "), collection.name()),
        format!("{} {}", l("Title:      "), util::or_dash(collection.title())),
        format!("{} {}", l("Data source:"), collection.data_source_key()),
        format!("{} {}", l("Template:   "), util::or_dash(collection.template())),
        format!("{} {}", l("Inherits:   "), util::join_or_dash(collection.inherits())),
        format!("{} {}", l("Filter key: "), collection.filter_target_key()),
        format!("{} {}", l("Hidden:     "), util::yes_no(collection.hidden())),
        format!("{} {}", l("Fields:     "), util::join_or_dash(&collection.field_names())),
        format!("{} {}", l("Methods:    "), util::join_or_dash(&collection.method_names())),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(manager: &DataSourceManager, args: CollectionsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        CollectionsCommand::List(list) => handle_list(manager, &list, global),

        CollectionsCommand::Get { target, data_source } => {
            manager.resolve_data_source(data_source.key())?;
            let collection = manager
                .get_collection(&target, data_source.key())
                .ok_or_else(|| CliError::not_found("collection", target.as_str(), "collections list"))?;
            let color = global.color_enabled();
            let out = output::render_single(
                global.format(),
                &collection.options(),
                |_| detail(&collection, color),
                |options| options.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CollectionsCommand::Fields {
            target,
            inherited,
            data_source,
        } => {
            manager.resolve_data_source(data_source.key())?;
            let collection = manager
                .get_collection(&target, data_source.key())
                .ok_or_else(|| CliError::not_found("collection", target.as_str(), "collections list"))?;
            let found: Vec<Arc<CollectionField>> = if inherited {
                manager
                    .resolve_data_source(Some(collection.data_source_key()))?
                    .collection_manager()
                    .get_all_fields(collection.name())
            } else {
                collection.get_fields()
            };
            fields::print_fields(&found, global)
        }

        CollectionsCommand::Inherits { name, data_source } => {
            let source = manager.resolve_data_source(data_source.key())?;
            let collections = source.collection_manager();
            if collections.get_collection(name.as_str()).is_none() {
                return Err(CliError::not_found("collection", name, "collections list"));
            }
            let rows: Vec<CollectionRow> = collections
                .get_inherit_chain(&name)
                .iter()
                .map(|parent| CollectionRow::from(parent.as_ref()))
                .collect();
            let out = output::render_list(global.format(), &rows, |r| CollectionTableRow::from(r), |r| r.name.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

fn handle_list(manager: &DataSourceManager, list: &CollectionListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let source = manager.resolve_data_source(list.data_source.key())?;
    let filter = Filter {
        name_includes: list.name.clone(),
        title_includes: list.title.clone(),
        hidden: list.hidden,
        page: Some(list.page),
        page_size: Some(list.page_size),
    };
    let page = CollectionRepository::from_manager(source.collection_manager()).page(&filter);

    let out = match global.format() {
        OutputFormat::Table | OutputFormat::Plain => {
            output::render_list(global.format(), &page.rows, |r| CollectionTableRow::from(r), |r| r.name.clone())?
        }
        structured => output::render_single(structured, &page, |_| String::new(), |_| String::new())?,
    };
    output::print_output(&out, global.quiet);

    if *global.format() == OutputFormat::Table && !global.quiet {
        eprintln!(
            "Page {} of {} ({} collections in '{}')",
            page.page,
            page.total_page.max(1),
            page.count,
            source.key()
        );
    }
    Ok(())
}
