//! Command implementations for the CLI
//!
//! This module contains the implementation of all CLI commands:
//! - start: Start the HTTP server
//! - test: Check the configuration and the spreadsheet
//! - config: Configuration display and validation
//! - extras: Search the extras price list
//! - plans: Show plans and their features
//! - ask: Interactive quote assistant

pub mod ask;
pub mod config;
pub mod extras;
pub mod plans;
pub mod start;

use anyhow::Result;
use pricing_desk::{config::Config, handlers::Services, sheets::PricingTables};
use std::sync::Arc;

/// Load the pricing tables once, outside the server
pub(crate) async fn load_tables(services: &Services) -> Result<Arc<PricingTables>> {
    let tables = services.tables.load(std::time::Instant::now()).await?;
    Ok(tables)
}

pub(crate) fn build_services(cfg: &Config) -> Services {
    Services::from_config(cfg, reqwest::Client::new())
}
