use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    // The server configures logging from its own config file
    if !matches!(args.get_command(), cli::Commands::Start) {
        pricing_desk::init_tracing("warn", "text");
    }

    match args.get_command() {
        cli::Commands::Start => {
            commands::start::execute(&args.config).await?;
        }
        cli::Commands::Test => {
            commands::test::execute(&args.config).await?;
        }
        cli::Commands::Config { action } => match action {
            cli::ConfigCommands::Show => commands::config::show(&args.config)?,
            cli::ConfigCommands::Validate => commands::config::validate(&args.config)?,
        },
        cli::Commands::Extras {
            category,
            authority,
            tab,
            words,
        } => {
            commands::extras::execute(&args.config, category, authority, &tab, &words).await?;
        }
        cli::Commands::Plans { plan } => {
            commands::plans::execute(&args.config, plan.as_deref()).await?;
        }
        cli::Commands::Ask => {
            commands::ask::execute(&args.config).await?;
        }
        cli::Commands::Version => {
            println!("Pricing Desk v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
