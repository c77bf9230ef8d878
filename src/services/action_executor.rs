//! Validation, coercion and dispatch of action definitions.
//!
//! Validation is fail-closed and happens before anything is resolved or
//! invoked. Dispatch has no rollback: side effects of a failed operation
//! are the ERP's to recover.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use super::operation_registry::{BoundArguments, ErpConnection, FormalParameter, OperationRegistry};
use crate::domain::errors::{ActionError, ExecutionError, ParameterValidationError};
use crate::domain::models::{ActionDefinition, ErpConfig, ParamValue};

/// Supplied parameters as received from the planner or the caller.
pub type SuppliedParameters = Map<String, Value>;

/// Parameters converted to their declared types, defaults included.
pub type CoercedParameters = BTreeMap<String, ParamValue>;

/// Required parameters absent from the supplied set, in declaration order.
pub fn missing_required(action: &ActionDefinition, supplied: &SuppliedParameters) -> Vec<String> {
    action
        .parameters
        .iter()
        .filter(|spec| spec.required && !supplied.contains_key(&spec.name))
        .map(|spec| spec.name.clone())
        .collect()
}

fn check_supplied(action: &ActionDefinition, supplied: &SuppliedParameters) -> Result<(), ParameterValidationError> {
    if let Some(unknown) = supplied.keys().find(|key| action.parameter(key).is_none()) {
        return Err(ParameterValidationError::UnknownParameter(unknown.clone()));
    }

    for (name, value) in supplied {
        if let Some(spec) = action.parameter(name) {
            if spec.data_type.coerce(value).is_none() {
                return Err(ParameterValidationError::TypeMismatch {
                    name: name.clone(),
                    expected: spec.data_type.to_string(),
                    actual: ParamValue::describe(value).to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Check presence, names and types. Nothing is converted.
pub fn validate(action: &ActionDefinition, supplied: &SuppliedParameters) -> Result<(), ParameterValidationError> {
    if let Some(missing) = missing_required(action, supplied).into_iter().next() {
        return Err(ParameterValidationError::MissingParameter(missing));
    }
    check_supplied(action, supplied)
}

fn coerce_supplied(
    action: &ActionDefinition,
    supplied: &SuppliedParameters,
) -> Result<CoercedParameters, ParameterValidationError> {
    let mut coerced = CoercedParameters::new();
    for spec in &action.parameters {
        let value = match (supplied.get(&spec.name), &spec.default_value) {
            (Some(value), _) => spec.data_type.coerce(value).ok_or_else(|| {
                ParameterValidationError::TypeMismatch {
                    name: spec.name.clone(),
                    expected: spec.data_type.to_string(),
                    actual: ParamValue::describe(value).to_string(),
                }
            })?,
            (None, Some(default)) => {
                spec.data_type
                    .coerce(default)
                    .ok_or_else(|| ParameterValidationError::InvalidDefault {
                        name: spec.name.clone(),
                        expected: spec.data_type.to_string(),
                    })?
            }
            (None, None) => continue,
        };
        coerced.insert(spec.name.clone(), value);
    }
    Ok(coerced)
}

/// Validate, then convert every supplied value and inject declared defaults.
pub fn prepare(
    action: &ActionDefinition,
    supplied: &SuppliedParameters,
) -> Result<CoercedParameters, ParameterValidationError> {
    validate(action, supplied)?;
    coerce_supplied(action, supplied)
}

/// Like [`prepare`], but tolerates absent required parameters and returns
/// their names so the caller can complete them before confirming.
pub fn prepare_partial(
    action: &ActionDefinition,
    supplied: &SuppliedParameters,
) -> Result<(CoercedParameters, Vec<String>), ParameterValidationError> {
    check_supplied(action, supplied)?;
    Ok((coerce_supplied(action, supplied)?, missing_required(action, supplied)))
}

/// Map coerced values onto formal parameters by name.
///
/// A formal with neither a value nor its own default fails the bind.
pub fn bind(formals: &[FormalParameter], coerced: &CoercedParameters) -> Result<BoundArguments, ExecutionError> {
    let mut arguments = BoundArguments::default();
    for formal in formals {
        let value = coerced
            .get(&formal.name)
            .or(formal.default.as_ref())
            .cloned()
            .ok_or_else(|| ExecutionError::MissingArgument(formal.name.clone()))?;
        arguments.insert(formal.name.clone(), value);
    }
    Ok(arguments)
}

/// Coerced parameters rendered back to JSON, for suggestions.
pub fn to_json_map(coerced: &CoercedParameters) -> Map<String, Value> {
    coerced
        .iter()
        .map(|(name, value)| (name.clone(), value.to_json()))
        .collect()
}

pub struct ActionExecutor {
    registry: Arc<OperationRegistry>,
    erp: ErpConfig,
}

impl ActionExecutor {
    pub fn new(registry: Arc<OperationRegistry>, erp: ErpConfig) -> Self {
        Self { registry, erp }
    }

    fn connection(&self, tenant_id: &str) -> ErpConnection {
        ErpConnection::new(tenant_id, self.erp.connection_for(tenant_id))
    }

    /// Validate, coerce, resolve, bind and invoke. Never retried.
    #[instrument(skip(self, action, supplied), fields(action = %action.name))]
    pub async fn execute(
        &self,
        tenant_id: &str,
        action: &ActionDefinition,
        supplied: &SuppliedParameters,
    ) -> Result<Value, ActionError> {
        let coerced = prepare(action, supplied)?;
        self.dispatch(tenant_id, action, &coerced).await
    }

    /// Dispatch already-coerced parameters.
    pub async fn dispatch(
        &self,
        tenant_id: &str,
        action: &ActionDefinition,
        coerced: &CoercedParameters,
    ) -> Result<Value, ActionError> {
        let target = action.target()?;
        let operation = self.registry.resolve(&target)?;
        let arguments = bind(operation.formal_parameters(), coerced)?;

        match operation.invoke(&self.connection(tenant_id), arguments).await {
            Ok(value) => {
                info!(target = %target, "action executed");
                Ok(value)
            }
            Err(err) => {
                warn!(target = %target, error = %err, "action failed");
                Err(ExecutionError::Failed {
                    target: target.to_string(),
                    message: format!("{err:#}"),
                }
                .into())
            }
        }
    }
}
