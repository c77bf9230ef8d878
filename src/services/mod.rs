//! Core assistant services: routing, grounding, generation, action dispatch,
//! metering and memoization.

pub mod action_executor;
pub mod action_planner;
pub mod action_resolver;
pub mod agents;
pub mod context_retriever;
pub mod erp_agent;
pub mod intent_classifier;
pub mod operation_registry;
pub mod orchestrator;
pub mod query_guard;
pub mod result_cache;
pub mod sql_agent;
pub mod support_agent;
pub mod token_ledger;

pub use action_executor::{ActionExecutor, CoercedParameters, SuppliedParameters};
pub use action_planner::{ActionPlan, ActionPlanner};
pub use action_resolver::{ActionMenu, ActionResolver};
pub use agents::{AgentHandler, Agents};
pub use context_retriever::{ContextRetriever, Retrieval};
pub use erp_agent::ErpAgent;
pub use intent_classifier::{Classification, IntentClassifier, IntentResolution};
pub use operation_registry::{
    BoundArguments, ErpConnection, ErpOperation, FormalParameter, OperationRegistry,
};
pub use orchestrator::{Orchestrator, Providers};
pub use query_guard::{SafetyVerdict, UnsafeReason};
pub use result_cache::ResultCache;
pub use sql_agent::SqlAgent;
pub use support_agent::SupportAgent;
pub use token_ledger::TokenLedger;
