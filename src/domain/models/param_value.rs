//! Declared parameter types and their native values.
//!
//! Coercion is lenient: a value whose JSON type differs from the declared
//! type is still accepted when its string form parses into that type.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared type of an action parameter.
///
/// Unknown names are kept verbatim in [`DataType::Other`] and accept any value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    String,
    Int,
    Long,
    Double,
    Decimal,
    Bool,
    DateTime,
    Any,
    Other(String),
}

impl DataType {
    /// Value types reject `null`; reference-like types accept it.
    pub const fn is_value_type(&self) -> bool {
        matches!(
            self,
            Self::Int | Self::Long | Self::Double | Self::Decimal | Self::Bool | Self::DateTime
        )
    }

    pub fn name(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Long => "long",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::Bool => "bool",
            Self::DateTime => "datetime",
            Self::Any => "object",
            Self::Other(name) => name,
        }
    }

    /// Convert a supplied JSON value to this type, or `None` when incompatible.
    pub fn coerce(&self, value: &Value) -> Option<ParamValue> {
        if value.is_null() {
            return (!self.is_value_type()).then_some(ParamValue::Null);
        }

        match self {
            Self::String => Some(ParamValue::String(match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })),
            Self::Int => match value {
                Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }
            .map(ParamValue::Int),
            Self::Long => match value {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }
            .map(ParamValue::Long),
            Self::Double => match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }
            .map(ParamValue::Double),
            Self::Decimal => match value {
                Value::Number(n) => Decimal::from_str(&n.to_string())
                    .or_else(|_| Decimal::from_scientific(&n.to_string()))
                    .ok(),
                Value::String(s) => Decimal::from_str(s.trim()).ok(),
                _ => None,
            }
            .map(ParamValue::Decimal),
            Self::Bool => match value {
                Value::Bool(b) => Some(*b),
                Value::String(s) => parse_bool(s),
                _ => None,
            }
            .map(ParamValue::Bool),
            Self::DateTime => match value {
                Value::String(s) => parse_datetime(s),
                _ => None,
            }
            .map(ParamValue::DateTime),
            Self::Any | Self::Other(_) => Some(ParamValue::Any(value.clone())),
        }
    }
}

impl From<String> for DataType {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "string" => Self::String,
            "int" | "int32" | "integer" => Self::Int,
            "long" | "int64" => Self::Long,
            "double" | "float" => Self::Double,
            "decimal" => Self::Decimal,
            "bool" | "boolean" => Self::Bool,
            "datetime" | "date" => Self::DateTime,
            "object" | "any" => Self::Any,
            _ => Self::Other(raw),
        }
    }
}

impl From<DataType> for String {
    fn from(ty: DataType) -> Self {
        match ty {
            DataType::Other(name) => name,
            known => known.name().to_string(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// A parameter value converted to its declared native type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    String(String),
    Int(i32),
    Long(i64),
    Double(f64),
    Decimal(Decimal),
    Bool(bool),
    DateTime(NaiveDateTime),
    Any(Value),
}

impl ParamValue {
    /// Short name of the runtime type, used in mismatch messages.
    pub fn describe(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(n) if n.is_f64() => "double",
            Value::Number(_) => "integer",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_aliases() {
        assert_eq!(DataType::from("Int32".to_string()), DataType::Int);
        assert_eq!(DataType::from("boolean".to_string()), DataType::Bool);
        assert_eq!(DataType::from("date".to_string()), DataType::DateTime);
        assert_eq!(
            DataType::from("Guid".to_string()),
            DataType::Other("Guid".to_string())
        );
    }

    #[test]
    fn test_lenient_string_coercion() {
        assert_eq!(DataType::Int.coerce(&json!("42")), Some(ParamValue::Int(42)));
        assert_eq!(DataType::Bool.coerce(&json!("TRUE")), Some(ParamValue::Bool(true)));
        assert_eq!(
            DataType::Decimal.coerce(&json!("12.50")),
            Some(ParamValue::Decimal(Decimal::new(1250, 2)))
        );
        assert!(DataType::Int.coerce(&json!("forty")).is_none());
        assert!(DataType::Int.coerce(&json!(3_000_000_000_i64)).is_none());
    }

    #[test]
    fn test_null_only_for_reference_types() {
        assert_eq!(DataType::String.coerce(&Value::Null), Some(ParamValue::Null));
        assert_eq!(DataType::Any.coerce(&Value::Null), Some(ParamValue::Null));
        assert!(DataType::Long.coerce(&Value::Null).is_none());
    }

    #[test]
    fn test_datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date");
        assert_eq!(
            DataType::DateTime.coerce(&json!("2024-03-01")),
            Some(ParamValue::DateTime(expected))
        );
        assert!(DataType::DateTime.coerce(&json!("2024-03-01T00:00:00Z")).is_some());
        assert!(DataType::DateTime.coerce(&json!(20_240_301)).is_none());
    }

    #[test]
    fn test_unknown_type_accepts_anything() {
        let ty = DataType::Other("Guid".to_string());
        assert_eq!(ty.coerce(&json!([1, 2])), Some(ParamValue::Any(json!([1, 2]))));
    }
}
