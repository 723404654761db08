use anyhow::{anyhow, Result};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use pricing_desk::{
    catalog::{self, ExtraItem, ExtraQuery, Facet},
    config,
};
use std::path::Path;

use super::{build_services, load_tables};

/// Execute the extras command
///
/// Filters the extras price list by facets and search words, restricted to one tab
pub async fn execute(
    config_path: &Path,
    category: Option<String>,
    authority: Option<String>,
    tab: &str,
    words: &[String],
) -> Result<()> {
    let cfg = config::load_config(config_path)?;
    let tab = catalog::find_tab(&cfg.catalog.tabs, tab).ok_or_else(|| {
        let known: Vec<&str> = cfg.catalog.tabs.iter().map(|t| t.id.as_str()).collect();
        anyhow!("Unknown tab '{}' (known tabs: {})", tab, known.join(", "))
    })?;

    let services = build_services(&cfg);
    let tables = load_tables(&services).await?;

    let query = ExtraQuery::new(
        Facet::from_selection(category.as_deref()),
        Facet::from_selection(authority.as_deref()),
        &words.join(" "),
    );
    let selection = catalog::filter_extras(&tables.extras, &cfg.columns, &query);
    let items = catalog::extras_view(&selection.table, tab, &cfg.columns);

    println!(
        "{} {}  {} {}  {} {}",
        "Tab:".cyan(),
        tab.label,
        "Category:".cyan(),
        query.category,
        "Authority:".cyan(),
        query.authority
    );

    if items.is_empty() {
        println!("{}", "No extras found".yellow());
        return Ok(());
    }

    println!("{}", render_items(&items));

    let summary = format!("{} extra(s)", items.len());
    if selection.applied {
        println!("{} {}", summary.green(), "(filtered)".dimmed());
    } else {
        println!("{}", summary.green());
    }

    Ok(())
}

fn render_items(items: &[ExtraItem]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("TITLE").fg(Color::Cyan),
        Cell::new("PRICE").fg(Color::Cyan),
        Cell::new("MULTIPLIER").fg(Color::Cyan),
        Cell::new("CATEGORY").fg(Color::Cyan),
        Cell::new("AUTHORITY").fg(Color::Cyan),
        Cell::new("RESPONSIBLE").fg(Color::Cyan),
        Cell::new("DESCRIPTION").fg(Color::Cyan),
    ]);

    for item in items {
        let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            Cell::new(&item.title),
            Cell::new(field(&item.price)),
            Cell::new(field(&item.multiplier)),
            Cell::new(field(&item.category)),
            Cell::new(field(&item.authority)),
            Cell::new(field(&item.responsible)),
            Cell::new(field(&item.description)),
        ]);
    }

    table
}
