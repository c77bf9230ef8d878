//! Domain layer for the ERP copilot
//!
//! Models, error taxonomy and the port traits external collaborators implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{
    ActionError, AssistantError, AssistantResult, ExecutionError, ParameterValidationError,
};
