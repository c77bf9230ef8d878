//! Command-line interface.

pub mod commands;
pub mod output;
pub mod types;

use anyhow::Result;
use console::style;

use crate::domain::models::Config;
pub use types::{ActionCommands, Cli, Commands, ConfigCommands};

/// Dispatch a parsed command against a loaded configuration.
pub async fn run(command: Commands, config: &Config, json: bool) -> Result<()> {
    match command {
        Commands::Config(command) => commands::config::execute(config, &command, json),
        Commands::Query {
            text,
            tenant,
            api_key,
            module,
            screen,
            selected,
        } => {
            let orchestrator = commands::orchestrator(config)?;
            let args = commands::query::QueryArgs {
                text,
                tenant,
                api_key,
                module,
                screen,
                selected,
            };
            commands::query::execute(&orchestrator, args, json).await
        }
        Commands::Actions(command) => {
            let orchestrator = commands::orchestrator(config)?;
            commands::actions::execute(&orchestrator, command, json).await
        }
        Commands::Balance { api_key } => {
            let orchestrator = commands::orchestrator(config)?;
            commands::balance::execute(&orchestrator, &api_key, json).await
        }
    }
}

/// Report a command failure and exit non-zero.
pub fn handle_error(err: &anyhow::Error, json: bool) -> ! {
    if json {
        let payload = serde_json::json!({ "success": false, "error": format!("{err:#}") });
        println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
    } else {
        eprintln!("{} {err:#}", style("error:").red().bold());
    }
    std::process::exit(1)
}
