//! CLI command implementations.

pub mod actions;
pub mod balance;
pub mod config;
pub mod query;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::domain::models::Config;
use crate::services::{OperationRegistry, Orchestrator, Providers};

/// Wire the pipeline against the configured HTTP services.
///
/// The stock binary registers no ERP operations; embedders build their own
/// [`OperationRegistry`] and call [`Orchestrator::new`] directly.
pub fn orchestrator(config: &Config) -> Result<Orchestrator> {
    let providers = Providers::from_config(config).context("Failed to build service clients")?;
    Ok(Orchestrator::new(config, providers, Arc::new(OperationRegistry::new())))
}
