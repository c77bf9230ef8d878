//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "erp-copilot")]
#[command(about = "ERP Copilot - natural-language assistant for ERP", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of .erp-copilot/
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask the assistant a question or request an operation
    Query {
        /// The request, in natural language
        text: String,

        /// Tenant (client) identifier
        #[arg(short, long)]
        tenant: String,

        /// API key used for balance checks and debits
        #[arg(short = 'k', long, env = "ERP_API_KEY", hide_env_values = true)]
        api_key: String,

        /// ERP module the request concerns
        #[arg(short, long)]
        module: Option<String>,

        /// Screen the user is on
        #[arg(long)]
        screen: Option<String>,

        /// Selected data as key=value (repeatable)
        #[arg(short, long = "select", value_parser = parse_key_value)]
        selected: Vec<(String, String)>,
    },

    /// Action definition commands
    #[command(subcommand)]
    Actions(ActionCommands),

    /// Show the token balance for an API key
    Balance {
        #[arg(short = 'k', long, env = "ERP_API_KEY", hide_env_values = true)]
        api_key: String,
    },

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ActionCommands {
    /// List actions available to a tenant
    List {
        #[arg(short, long)]
        tenant: String,

        #[arg(short, long)]
        module: Option<String>,
    },

    /// Search actions by meaning and keywords
    Search {
        text: String,

        #[arg(short, long)]
        tenant: String,

        #[arg(short, long)]
        module: Option<String>,

        /// Maximum number of actions to show
        #[arg(long, default_value = "5")]
        top: usize,
    },

    /// Show one action definition by id
    Show {
        id: String,

        #[arg(short, long)]
        tenant: String,
    },

    /// Execute a confirmed action with explicit parameters
    Run {
        /// Action name
        name: String,

        #[arg(short, long)]
        tenant: String,

        /// Parameters as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as YAML, secrets masked
    Show,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("customerId = C42"),
            Ok(("customerId".to_string(), "C42".to_string()))
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_query_command_parses() {
        let cli = Cli::try_parse_from([
            "erp-copilot", "--json", "query", "Quante vendite?", "-t", "acme", "-k", "key",
            "--select", "orderId=42",
        ])
        .expect("valid arguments");
        assert!(cli.json);
        match cli.command {
            Commands::Query { tenant, selected, .. } => {
                assert_eq!(tenant, "acme");
                assert_eq!(selected, vec![("orderId".to_string(), "42".to_string())]);
            }
            _ => panic!("expected query command"),
        }
    }
}
