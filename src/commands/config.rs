use anyhow::Result;
use colored::Colorize;
use pricing_desk::config::{self, Config};
use std::path::Path;
use tracing::info;

/// Execute the config show command
///
/// Displays the current configuration with secrets masked
pub fn show(config_path: &Path) -> Result<()> {
    println!("{}", "Loading configuration...".yellow());
    info!("Loading configuration for display");

    let cfg = config::load_config(config_path)?;
    let sanitized = sanitize_secrets(&cfg);

    println!("{}", "Current Configuration:".green().bold());
    println!();

    let toml_string = toml::to_string_pretty(&sanitized)?;
    println!("{}", toml_string);

    Ok(())
}

/// Execute the config validate command
pub fn validate(config_path: &Path) -> Result<()> {
    println!("{}", "Validating configuration...".yellow());

    let cfg = config::load_config(config_path)?;

    println!("{}", "✓ Configuration is valid".green());
    println!();
    println!("{}", "Summary:".bold());
    println!("  Spreadsheet: {}", cfg.sheets.spreadsheet_id);
    println!("  Catalog tabs: {}", cfg.catalog.tabs.len());
    println!("  Feature detail rules: {}", cfg.catalog.feature_details.len());
    println!(
        "  Assistant: {}",
        if cfg.assistant.enabled { "enabled" } else { "disabled" }
    );

    info!("Configuration validation successful");
    Ok(())
}

fn sanitize_secrets(cfg: &Config) -> Config {
    let mut sanitized = cfg.clone();
    sanitized.assistant.api_key = mask_api_key(&sanitized.assistant.api_key);
    sanitized
}

/// Mask an API key for safe display
///
/// Shows first 7 and last 4 characters
/// Example: "gsk-1234567890abcdef" -> "gsk-123...cdef"
fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 11 {
        return "***".to_string();
    }

    let prefix: String = chars[..7].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", prefix, suffix)
}
