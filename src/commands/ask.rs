use anyhow::{bail, Result};
use colored::Colorize;
use pricing_desk::{
    assistant::{build_system_prompt, Conversation},
    config,
};
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{build_services, load_tables};

/// A line typed at the prompt
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Message(&'a str),
    Retry,
    Reset,
    Exit,
    Empty,
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Empty,
        "/retry" => Input::Retry,
        "/reset" => Input::Reset,
        "/exit" | "/quit" => Input::Exit,
        message => Input::Message(message),
    }
}

/// Execute the ask command
///
/// Reads questions from stdin until EOF or /exit. A failed answer can be
/// resent with /retry; /reset starts a new conversation.
pub async fn execute(config_path: &Path) -> Result<()> {
    let cfg = config::load_config(config_path)?;
    let services = build_services(&cfg);
    let Some(backend) = services.assistant.clone() else {
        bail!("The quote assistant is disabled in the configuration");
    };

    let mut conversation = Conversation::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", "Quote assistant ready. Commands: /retry, /reset, /exit".green());

    loop {
        print!("{} ", ">".cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let input = parse_input(&line);
        if matches!(input, Input::Empty) {
            continue;
        }
        if matches!(input, Input::Exit) {
            break;
        }
        if matches!(input, Input::Reset) {
            conversation.reset();
            println!("{}", "Conversation cleared".yellow());
            continue;
        }

        // Rebuilt every turn so answers follow the latest sheet contents
        let tables = match load_tables(&services).await {
            Ok(tables) => tables,
            Err(e) => {
                println!("{} {}", "Could not load pricing tables:".red(), e);
                continue;
            }
        };
        let system_prompt =
            build_system_prompt(&tables, &cfg.columns, cfg.assistant.prompt_variant);

        let result = match input {
            Input::Message(message) => {
                conversation
                    .ask(backend.as_ref(), &system_prompt, message)
                    .await
            }
            _ => conversation.retry(backend.as_ref(), &system_prompt).await,
        };

        match result {
            Ok(reply) => println!("\n{}\n", reply),
            Err(e) => {
                println!("{} {}", "Assistant error:".red(), e);
                if conversation.has_pending_turn() {
                    println!("{}", "Type /retry to send the question again".dimmed());
                }
            }
        }
    }

    Ok(())
}
