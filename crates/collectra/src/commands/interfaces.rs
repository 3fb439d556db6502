//! Field interface command handlers.

use std::sync::Arc;

use collectra_core::{DataSourceManager, FieldInterface};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{GlobalOpts, InterfacesArgs, InterfacesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct InterfaceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Type")]
    storage_type: String,
    #[tabled(rename = "Association")]
    association: String,
    #[tabled(rename = "Operators")]
    operators: usize,
}

impl From<&Arc<FieldInterface>> for InterfaceRow {
    fn from(i: &Arc<FieldInterface>) -> Self {
        Self {
            name: i.name.clone(),
            title: util::or_dash(i.title.as_deref()),
            group: util::or_dash(i.group.as_deref()),
            storage_type: util::or_dash(i.storage_type()),
            association: util::yes_no(i.is_association),
            operators: i.filterable.as_ref().map_or(0, |f| f.operators.len()),
        }
    }
}

#[derive(Clone, Serialize, Tabled)]
struct GroupRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Order")]
    order: i32,
}

fn detail(i: &Arc<FieldInterface>, color: bool) -> String {
    let l = |text: &str| output::label(text, color);
    let mut lines = vec![
        format!("{} {}", l("Name:      "), i.name),
        format!("{} {}", l("Title:     "), util::or_dash(i.title.as_deref())),
        format!("{} {}", l("Group:     "), util::or_dash(i.group.as_deref())),
        format!("{} {}", l("Order:     "), i.order),
        format!("{} {}", l("Type:      "), util::or_dash(i.storage_type())),
        format!("{} {}", l("Types:     "), util::join_or_dash(&i.available_types)),
        format!("{} {}", l("Sortable:  "), util::yes_no(i.sortable)),
        format!("{} {}", l("Titleable: "), util::yes_no(i.title_usable)),
    ];
    if let Some(filterable) = &i.filterable {
        let operators: Vec<&str> = filterable.operators.iter().map(|op| op.value.as_str()).collect();
        lines.push(format!("{} {}", l("Operators: "), util::join_or_dash(&operators)));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(manager: &DataSourceManager, args: InterfacesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let registry = manager.field_interfaces();
    match args.command {
        InterfacesCommand::List { group } => {
            let interfaces: Vec<Arc<FieldInterface>> = registry
                .get_all()
                .into_iter()
                .filter(|i| group.is_none() || i.group == group)
                .collect();
            let out = output::render_list(
                global.format(),
                &interfaces,
                |i| InterfaceRow::from(i),
                |i| i.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        InterfacesCommand::Get { name } => {
            let interface = registry
                .get(&name)
                .ok_or_else(|| CliError::not_found("field interface", name, "interfaces list"))?;
            let color = global.color_enabled();
            let out = output::render_single(
                global.format(),
                &interface,
                |i| detail(i, color),
                |i| i.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        InterfacesCommand::Groups => {
            let mut groups: Vec<GroupRow> = registry
                .get_groups()
                .into_iter()
                .map(|(name, group)| GroupRow {
                    name,
                    label: group.label,
                    order: group.order,
                })
                .collect();
            groups.sort_by_key(|g| g.order);
            let out = output::render_list(global.format(), &groups, GroupRow::clone, |g| g.name.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
