use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::param_value::DataType;
use crate::domain::errors::ExecutionError;

/// Metadata describing a named ERP operation.
///
/// Owned by an external management surface; the core only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
    pub id: String,

    /// Owning tenant, or `"common"` for actions shared by every tenant
    #[serde(rename = "clientId")]
    pub tenant_id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Two-part qualified reference, `Qualifier.operation`
    #[serde(rename = "functionName")]
    pub target_reference: String,

    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,

    #[serde(default)]
    pub requires_confirmation: bool,

    #[serde(default)]
    pub module: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default = "default_action_type")]
    pub action_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_action_type() -> String {
    "erp".to_string()
}

impl ActionDefinition {
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Parameter names must be unique within a definition.
    pub fn has_unique_parameters(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.parameters.len());
        self.parameters.iter().all(|p| seen.insert(p.name.as_str()))
    }

    pub fn target(&self) -> Result<TargetReference, ExecutionError> {
        TargetReference::parse(&self.target_reference)
    }

    pub fn visible_to(&self, tenant_id: &str) -> bool {
        self.tenant_id == tenant_id || self.tenant_id == COMMON_TENANT
    }
}

/// Tenant id used for definitions and documents shared by all tenants.
pub const COMMON_TENANT: &str = "common";

/// Declared parameter of an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    pub name: String,

    pub data_type: DataType,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            description: String::new(),
            required: false,
            default_value: None,
        }
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// Registry key of an operation: a type/module qualifier and an operation name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetReference {
    pub qualifier: String,
    pub operation: String,
}

impl TargetReference {
    pub fn new(qualifier: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            qualifier: qualifier.into(),
            operation: operation.into(),
        }
    }

    /// Split `Ns.Type.Method` at the last dot.
    pub fn parse(raw: &str) -> Result<Self, ExecutionError> {
        let raw = raw.trim();
        match raw.rsplit_once('.') {
            Some((qualifier, operation)) if !qualifier.is_empty() && !operation.is_empty() => {
                Ok(Self::new(qualifier, operation))
            }
            _ => Err(ExecutionError::InvalidTarget(raw.to_string())),
        }
    }
}

impl fmt::Display for TargetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.qualifier, self.operation)
    }
}
