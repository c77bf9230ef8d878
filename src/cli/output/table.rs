//! Table output for action listings and suggestions, using comfy-table.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use console::style;

use super::truncate;
use crate::domain::models::{ActionDefinition, DocumentReference, SuggestedAction};

fn base_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
        );
    table
}

/// Render a table with a count line, or a "No ... found." line when empty.
pub fn render_list(entity_name: &str, table: &Table, total: usize) -> String {
    if total == 0 {
        return format!("No {entity_name}s found.");
    }
    let plural = if total == 1 { "" } else { "s" };
    format!("{} {entity_name}{plural}:\n{table}", style(total).bold())
}

pub fn action_table(actions: &[ActionDefinition]) -> Table {
    let mut table = base_table(&["Name", "Description", "Module", "Parameters", "Confirm", "Owner"]);
    for action in actions {
        let parameters = action
            .parameters
            .iter()
            .map(|p| {
                if p.required {
                    format!("{}*: {}", p.name, p.data_type)
                } else {
                    format!("{}: {}", p.name, p.data_type)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        let confirm = if action.requires_confirmation {
            Cell::new("yes").fg(Color::Yellow)
        } else {
            Cell::new("no")
        };

        table.add_row(vec![
            Cell::new(&action.name),
            Cell::new(truncate(&action.description, 50)),
            Cell::new(action.module.as_deref().unwrap_or("-")),
            Cell::new(if parameters.is_empty() { "-".to_string() } else { parameters }),
            confirm,
            Cell::new(&action.tenant_id),
        ]);
    }
    table
}

pub fn suggestion_table(suggestions: &[SuggestedAction]) -> Table {
    let mut table = base_table(&["Type", "Title", "Parameters"]);
    for suggestion in suggestions {
        let parameters = suggestion
            .parameters
            .as_ref()
            .map(|p| serde_json::Value::Object(p.clone()).to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(&suggestion.action_type).fg(Color::Cyan),
            Cell::new(&suggestion.title),
            Cell::new(truncate(&parameters, 80)),
        ]);
    }
    table
}

pub fn source_table(sources: &[DocumentReference]) -> Table {
    let mut table = base_table(&["Title", "Kind", "Snippet"]);
    for source in sources {
        table.add_row(vec![
            Cell::new(&source.title),
            Cell::new(&source.kind),
            Cell::new(truncate(&source.snippet, 60)),
        ]);
    }
    table
}
