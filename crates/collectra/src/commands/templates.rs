//! Collection template command handlers.

use collectra_core::{CollectionTemplate, DataSourceManager};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Row ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateView {
    name: String,
    title: Option<String>,
    order: i32,
    behavior: Option<String>,
    methods: Vec<String>,
    collections: usize,
}

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Order")]
    order: i32,
    #[tabled(rename = "Methods")]
    methods: String,
    #[tabled(rename = "Collections")]
    collections: usize,
}

impl From<&TemplateView> for TemplateRow {
    fn from(t: &TemplateView) -> Self {
        Self {
            name: t.name.clone(),
            title: util::or_dash(t.title.as_deref()),
            order: t.order,
            methods: util::join_or_dash(&t.methods),
            collections: t.collections,
        }
    }
}

fn view(manager: &DataSourceManager, template: &CollectionTemplate) -> TemplateView {
    let behavior = template.collection();
    TemplateView {
        name: template.name().to_owned(),
        title: template.title().map(str::to_owned),
        order: template.order(),
        behavior: behavior.map(|b| b.name().to_owned()),
        methods: behavior
            .map(|b| b.method_names().map(str::to_owned).collect())
            .unwrap_or_default(),
        collections: manager
            .get_all_collections_where(|c| c.template() == Some(template.name()))
            .iter()
            .map(|group| group.collections.len())
            .sum(),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(manager: &DataSourceManager, global: &GlobalOpts) -> Result<(), CliError> {
    let mut templates: Vec<TemplateView> = manager
        .collection_templates()
        .get_all()
        .iter()
        .map(|t| view(manager, t))
        .collect();
    templates.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));

    let out = output::render_list(global.format(), &templates, |t| TemplateRow::from(t), |t| t.name.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
