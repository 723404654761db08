use anyhow::Result;
use colored::Colorize;
use pricing_desk::{config, init_tracing, server};
use std::path::Path;
use tracing::info;

/// Execute the start command
///
/// Loads the configuration, sets up logging from it and serves until shutdown
pub async fn execute(config_path: &Path) -> Result<()> {
    println!("{}", "Starting pricing desk...".green());

    let cfg = config::load_config(config_path)?;
    init_tracing(&cfg.server.log_level, &cfg.server.log_format);

    info!(config = %config_path.display(), "Starting pricing desk");

    // Blocks until shutdown
    server::start_server(cfg, config_path.to_path_buf()).await?;

    Ok(())
}
