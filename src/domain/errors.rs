//! Domain errors for the ERP copilot core.
//!
//! Fatal request failures are [`AssistantError`]. Expected, inspectable
//! outcomes (unsafe SQL, an unresolved intent) are plain values and never
//! appear here. Parameter validation and dispatch failures have their own
//! enums so the executor contract stays explicit.

use thiserror::Error;

/// Top-level error taxonomy for a single assistant request.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Token balance exhausted ({remaining} remaining). Purchase additional credits.")]
    AuthorizationExhausted { remaining: i64 },

    #[error("Action not found: {0}")]
    ActionNotFound(String),

    #[error("Parameter validation failed: {0}")]
    ParameterValidation(#[from] ParameterValidationError),

    #[error("Action execution failed: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Token debit failed: {0}")]
    BillingDebitFailure(String),

    #[error("{provider} call failed: {message}")]
    DownstreamProvider { provider: String, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AssistantError {
    /// Shorthand for a downstream provider failure.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DownstreamProvider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

pub type AssistantResult<T> = Result<T, AssistantError>;

impl From<serde_json::Error> for AssistantError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Supplied parameters rejected before any dispatch happens.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParameterValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Incompatible type for parameter {name}: expected {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Default value for parameter {name} does not fit declared type {expected}")]
    InvalidDefault { name: String, expected: String },
}

/// Failures while resolving or invoking a registered operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Invalid target reference '{0}': expected Qualifier.operation")]
    InvalidTarget(String),

    #[error("No operation registered for {0}")]
    OperationNotRegistered(String),

    #[error("Missing argument for formal parameter {0}")]
    MissingArgument(String),

    #[error("Operation {target} failed: {message}")]
    Failed { target: String, message: String },
}

/// Either side of the executor contract.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] ParameterValidationError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl From<ActionError> for AssistantError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::Validation(e) => Self::ParameterValidation(e),
            ActionError::Execution(e) => Self::Execution(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_error_maps_to_taxonomy() {
        let err: AssistantError =
            ActionError::Validation(ParameterValidationError::MissingParameter("qty".into())).into();
        assert!(matches!(err, AssistantError::ParameterValidation(_)));

        let err: AssistantError =
            ActionError::Execution(ExecutionError::OperationNotRegistered("X.y".into())).into();
        assert!(matches!(err, AssistantError::Execution(_)));
    }

    #[test]
    fn test_messages_name_the_parameter() {
        let err = ParameterValidationError::UnknownParameter("colour".into());
        assert_eq!(err.to_string(), "Unknown parameter: colour");

        let err = AssistantError::provider("completion", "HTTP 500");
        assert_eq!(err.to_string(), "completion call failed: HTTP 500");
    }
}
