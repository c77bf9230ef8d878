//! ERP Copilot CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;

use erp_copilot::cli::{self, Cli};
use erp_copilot::domain::models::Config;
use erp_copilot::infrastructure::config::ConfigLoader;
use erp_copilot::infrastructure::logging::{LogConfig, LoggerImpl};

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => ConfigLoader::load().context("Failed to load configuration"),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => cli::handle_error(&err, cli.json),
    };

    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => logger,
        Err(err) => cli::handle_error(&err.context("Failed to initialize logging"), cli.json),
    };

    if let Err(err) = cli::run(cli.command, &config, cli.json).await {
        cli::handle_error(&err, cli.json);
    }
}
