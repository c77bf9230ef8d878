//! Startup-time registry of callable ERP operations.
//!
//! Operations are addressed by their two-part [`TargetReference`] and are
//! registered explicitly, either as trait objects or by wrapping closures
//! with [`OperationRegistry::register_sync`] / [`OperationRegistry::register_async`].

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use crate::domain::errors::ExecutionError;
use crate::domain::models::{ParamValue, TargetReference};

/// Tenant-scoped connection context an operation runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErpConnection {
    pub tenant_id: String,
    pub connection_string: String,
}

impl ErpConnection {
    pub fn new(tenant_id: impl Into<String>, connection_string: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            connection_string: connection_string.into(),
        }
    }
}

/// A formal parameter of an operation, with its own default if any.
#[derive(Debug, Clone, PartialEq)]
pub struct FormalParameter {
    pub name: String,
    pub default: Option<ParamValue>,
}

impl FormalParameter {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, default: ParamValue) -> Self {
        Self {
            name: name.into(),
            default: Some(default),
        }
    }
}

/// Arguments mapped onto an operation's formal parameters, by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArguments {
    values: HashMap<String, ParamValue>,
}

impl BoundArguments {
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn require(&self, name: &str) -> anyhow::Result<&ParamValue> {
        self.values
            .get(name)
            .ok_or_else(|| anyhow!("argument '{name}' is not bound"))
    }

    pub fn str(&self, name: &str) -> anyhow::Result<&str> {
        match self.require(name)? {
            ParamValue::String(s) => Ok(s),
            other => bail!("argument '{name}' is not a string: {other:?}"),
        }
    }

    pub fn i64(&self, name: &str) -> anyhow::Result<i64> {
        match self.require(name)? {
            ParamValue::Int(v) => Ok(i64::from(*v)),
            ParamValue::Long(v) => Ok(*v),
            other => bail!("argument '{name}' is not an integer: {other:?}"),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn f64(&self, name: &str) -> anyhow::Result<f64> {
        match self.require(name)? {
            ParamValue::Double(v) => Ok(*v),
            ParamValue::Int(v) => Ok(f64::from(*v)),
            ParamValue::Long(v) => Ok(*v as f64),
            ParamValue::Decimal(v) => v
                .to_f64()
                .ok_or_else(|| anyhow!("argument '{name}' does not fit a double")),
            other => bail!("argument '{name}' is not numeric: {other:?}"),
        }
    }

    pub fn decimal(&self, name: &str) -> anyhow::Result<Decimal> {
        match self.require(name)? {
            ParamValue::Decimal(v) => Ok(*v),
            ParamValue::Int(v) => Ok(Decimal::from(*v)),
            ParamValue::Long(v) => Ok(Decimal::from(*v)),
            ParamValue::Double(v) => {
                Decimal::from_f64(*v).ok_or_else(|| anyhow!("argument '{name}' does not fit a decimal"))
            }
            other => bail!("argument '{name}' is not numeric: {other:?}"),
        }
    }

    pub fn bool(&self, name: &str) -> anyhow::Result<bool> {
        match self.require(name)? {
            ParamValue::Bool(v) => Ok(*v),
            other => bail!("argument '{name}' is not a bool: {other:?}"),
        }
    }

    pub fn datetime(&self, name: &str) -> anyhow::Result<NaiveDateTime> {
        match self.require(name)? {
            ParamValue::DateTime(v) => Ok(*v),
            other => bail!("argument '{name}' is not a datetime: {other:?}"),
        }
    }

    /// Any argument as JSON; unbound names read as `null`.
    pub fn value(&self, name: &str) -> Value {
        self.values.get(name).map_or(Value::Null, ParamValue::to_json)
    }
}

/// Uniform contract of a registered operation.
#[async_trait]
pub trait ErpOperation: Send + Sync {
    fn formal_parameters(&self) -> &[FormalParameter];

    async fn invoke(&self, connection: &ErpConnection, arguments: BoundArguments) -> anyhow::Result<Value>;
}

type SyncFn = dyn Fn(&ErpConnection, &BoundArguments) -> anyhow::Result<Value> + Send + Sync;
type AsyncFn = dyn Fn(ErpConnection, BoundArguments) -> Pin<Box<dyn Future<Output = anyhow::Result<Value>> + Send>>
    + Send
    + Sync;

struct SyncOperation {
    parameters: Vec<FormalParameter>,
    call: Box<SyncFn>,
}

#[async_trait]
impl ErpOperation for SyncOperation {
    fn formal_parameters(&self) -> &[FormalParameter] {
        &self.parameters
    }

    async fn invoke(&self, connection: &ErpConnection, arguments: BoundArguments) -> anyhow::Result<Value> {
        (self.call)(connection, &arguments)
    }
}

struct AsyncOperation {
    parameters: Vec<FormalParameter>,
    call: Box<AsyncFn>,
}

#[async_trait]
impl ErpOperation for AsyncOperation {
    fn formal_parameters(&self) -> &[FormalParameter] {
        &self.parameters
    }

    async fn invoke(&self, connection: &ErpConnection, arguments: BoundArguments) -> anyhow::Result<Value> {
        (self.call)(connection.clone(), arguments).await
    }
}

#[derive(Default, Clone)]
pub struct OperationRegistry {
    operations: HashMap<TargetReference, Arc<dyn ErpOperation>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation; a later registration for the same target replaces it.
    pub fn register(&mut self, target: TargetReference, operation: Arc<dyn ErpOperation>) {
        debug!(target = %target, "operation registered");
        self.operations.insert(target, operation);
    }

    pub fn register_sync<F>(
        &mut self,
        target: &str,
        parameters: Vec<FormalParameter>,
        call: F,
    ) -> Result<(), ExecutionError>
    where
        F: Fn(&ErpConnection, &BoundArguments) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let target = TargetReference::parse(target)?;
        self.register(
            target,
            Arc::new(SyncOperation {
                parameters,
                call: Box::new(call),
            }),
        );
        Ok(())
    }

    pub fn register_async<F, Fut>(
        &mut self,
        target: &str,
        parameters: Vec<FormalParameter>,
        call: F,
    ) -> Result<(), ExecutionError>
    where
        F: Fn(ErpConnection, BoundArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        let target = TargetReference::parse(target)?;
        self.register(
            target,
            Arc::new(AsyncOperation {
                parameters,
                call: Box::new(move |connection, arguments| Box::pin(call(connection, arguments))),
            }),
        );
        Ok(())
    }

    pub fn resolve(&self, target: &TargetReference) -> Result<Arc<dyn ErpOperation>, ExecutionError> {
        self.operations
            .get(target)
            .cloned()
            .ok_or_else(|| ExecutionError::OperationNotRegistered(target.to_string()))
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Registered targets, sorted.
    pub fn targets(&self) -> Vec<String> {
        let mut targets: Vec<_> = self.operations.keys().map(ToString::to_string).collect();
        targets.sort();
        targets
    }
}

impl fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("targets", &self.targets())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn connection() -> ErpConnection {
        ErpConnection::new("acme", "Server=erp")
    }

    #[tokio::test]
    async fn test_sync_registration_and_invoke() {
        let mut registry = OperationRegistry::new();
        registry
            .register_sync(
                "Erp.Sales.OrderService.Total",
                vec![FormalParameter::required("qty"), FormalParameter::required("price")],
                |_, args| {
                    let total = args.decimal("price")? * Decimal::from(args.i64("qty")?);
                    Ok(json!({ "total": total.to_string() }))
                },
            )
            .expect("valid target");

        let target = TargetReference::parse("Erp.Sales.OrderService.Total").expect("target");
        let operation = registry.resolve(&target).expect("registered");
        assert_eq!(operation.formal_parameters().len(), 2);

        let mut args = BoundArguments::default();
        args.insert("qty", ParamValue::Int(3));
        args.insert("price", ParamValue::Decimal(Decimal::new(250, 2)));
        let result = operation.invoke(&connection(), args).await.expect("invoke");
        assert_eq!(result, json!({"total": "7.50"}));
    }

    #[tokio::test]
    async fn test_async_registration_sees_connection() {
        let mut registry = OperationRegistry::new();
        registry
            .register_async("Erp.Admin.Ping", vec![], |connection, _| async move {
                Ok::<_, anyhow::Error>(json!({ "tenant": connection.tenant_id }))
            })
            .expect("valid target");

        let operation = registry
            .resolve(&TargetReference::new("Erp.Admin", "Ping"))
            .expect("registered");
        let result = operation
            .invoke(&connection(), BoundArguments::default())
            .await
            .expect("invoke");
        assert_eq!(result, json!({"tenant": "acme"}));
    }

    #[test]
    fn test_unregistered_and_invalid_targets() {
        let mut registry = OperationRegistry::new();
        assert_eq!(
            registry.resolve(&TargetReference::new("Erp.Sales", "Missing")).err(),
            Some(ExecutionError::OperationNotRegistered("Erp.Sales.Missing".into()))
        );
        assert!(matches!(
            registry.register_sync("NoDot", vec![], |_, _| Ok(Value::Null)),
            Err(ExecutionError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_typed_getters_report_mismatch() {
        let mut args = BoundArguments::default();
        args.insert("name", ParamValue::String("ACME".into()));
        assert_eq!(args.str("name").expect("string"), "ACME");
        assert!(args.i64("name").is_err());
        assert!(args.bool("missing").is_err());
        assert_eq!(args.value("missing"), Value::Null);
    }
}
