use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pricing-desk", version, about = "Payroll pricing desk")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the HTTP server (default)
    Start,

    /// Test configuration and spreadsheet access
    Test,

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Search the extras price list
    Extras {
        /// Category facet (substring, case-insensitive)
        #[arg(long)]
        category: Option<String>,

        /// Authority facet (substring, case-insensitive)
        #[arg(short, long)]
        authority: Option<String>,

        /// Catalog tab id
        #[arg(short, long, default_value = "all")]
        tab: String,

        /// Search words; every word must appear in the title or description
        words: Vec<String>,
    },

    /// List plans, or the feature matrix of one plan
    Plans {
        /// Plan name
        #[arg(short, long)]
        plan: Option<String>,
    },

    /// Chat with the quote assistant on stdin
    Ask,

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Display current configuration (with secrets masked)
    Show,

    /// Validate configuration file
    Validate,
}

impl Cli {
    /// Get the command to execute, defaulting to Start if none provided
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Start)
    }
}
