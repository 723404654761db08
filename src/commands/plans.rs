use anyhow::Result;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use pricing_desk::{
    catalog::{self, PlanFeature},
    config,
};
use std::path::Path;

use super::{build_services, load_tables};

/// Execute the plans command
///
/// Without a plan, lists the plan names; with one, prints its feature matrix
pub async fn execute(config_path: &Path, plan: Option<&str>) -> Result<()> {
    let cfg = config::load_config(config_path)?;
    let services = build_services(&cfg);
    let tables = load_tables(&services).await?;

    let names = catalog::plan_names(&tables.plans, &cfg.columns);

    let Some(plan) = plan else {
        println!("{}", "Plans:".bold());
        for name in &names {
            println!("  {}", name);
        }
        return Ok(());
    };

    let features = catalog::plan_features(&tables, plan, &cfg.columns, &cfg.catalog.feature_details);
    if features.is_empty() {
        println!("{} '{}'", "Unknown plan".red(), plan);
        println!("Available plans: {}", names.join(", "));
        return Ok(());
    }

    println!("{} {}", "Plan:".cyan(), plan.to_uppercase());
    println!("{}", render_features(&features));

    Ok(())
}

fn render_features(features: &[PlanFeature]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("FEATURE").fg(Color::Cyan),
        Cell::new("INCLUDED").fg(Color::Cyan),
        Cell::new("DETAILS").fg(Color::Cyan),
    ]);

    for feature in features {
        let included = if feature.included {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new(feature.raw.as_deref().unwrap_or("no")).fg(Color::Red)
        };

        table.add_row(vec![
            Cell::new(&feature.feature),
            included,
            Cell::new(feature.details.join("\n")),
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_features() {
        let features = vec![
            PlanFeature {
                feature: "Payroll all-inclusive".to_string(),
                raw: Some("✅".to_string()),
                included: true,
                details: vec!["Elaborazione cedolini".to_string()],
            },
            PlanFeature {
                feature: "Portale HR".to_string(),
                raw: None,
                included: false,
                details: vec![],
            },
        ];

        let rendered = render_features(&features).to_string();
        assert!(rendered.contains("Elaborazione cedolini"));
        assert!(rendered.contains("yes"));
        assert!(rendered.contains("no"));
    }
}
