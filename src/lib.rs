//! ERP Copilot - multi-agent natural-language assistant core for ERP
//!
//! A query is classified into one of three agents, answered from grounding
//! documents retrieved per tenant, and metered against an external token
//! balance:
//!
//! - **rag**: generates a read-only SQL query, gated by a safety check
//! - **support**: answers how-to questions from support documentation
//! - **erp**: plans and dispatches a registered ERP operation, or asks for
//!   confirmation first when the action requires it
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, ports and the error taxonomy
//! - **Service Layer** (`services`): the request pipeline and its agents
//! - **Infrastructure Layer** (`infrastructure`): HTTP clients, config, logging
//! - **Adapters** (`adapters`): in-process response cache
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use erp_copilot::{ConfigLoader, OperationRegistry, Orchestrator, Providers, QueryRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let mut registry = OperationRegistry::new();
//!     registry.register_sync("Erp.Orders.Create", vec![], |_, _| Ok(serde_json::json!({})))?;
//!
//!     let orchestrator = Orchestrator::new(&config, Providers::from_config(&config)?, Arc::new(registry));
//!     let response = orchestrator
//!         .process_with_key(&QueryRequest::new("Quante vendite ho fatto a marzo?", "acme"), "api-key")
//!         .await;
//!     println!("{}", serde_json::to_string_pretty(&response)?);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::errors::{
    ActionError, AssistantError, AssistantResult, ExecutionError, ParameterValidationError,
};
pub use domain::models::{
    ActionDefinition, AgentLabel, AssistantResponse, Config, ConversationContext, ParameterSpec,
    QueryRequest, RequestContext, SuggestedAction, TokenUsageRecord,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{OperationRegistry, Orchestrator, Providers};
