//! Field descriptors and declared field types.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::Schema;

/// Declared type of a schema field.
///
/// In schema files the scalar types are plain strings (`"integer"`) and the
/// composite types are single-key objects (`{"array": "string"}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    /// Signed 64-bit integer.
    Integer,
    /// Finite 64-bit float.
    Float,
    Boolean,
    /// Any JSON value, passed through untouched.
    Any,
    Array(Box<FieldType>),
    /// Nested document described by its own schema.
    Object(Box<Schema>),
    /// The inner type, or null.
    Nullable(Box<FieldType>),
}

impl FieldType {
    pub fn array(element: FieldType) -> Self {
        Self::Array(Box::new(element))
    }

    pub fn object(schema: Schema) -> Self {
        Self::Object(Box::new(schema))
    }

    pub fn nullable(inner: FieldType) -> Self {
        Self::Nullable(Box::new(inner))
    }

    /// Returns true if null is a valid value for this type.
    pub fn is_nullable(&self) -> bool {
        matches!(self, Self::Nullable(_) | Self::Any)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("float"),
            Self::Boolean => f.write_str("boolean"),
            Self::Any => f.write_str("any"),
            Self::Array(element) => write!(f, "array<{element}>"),
            Self::Object(schema) => write!(f, "object<{}>", schema.name()),
            Self::Nullable(inner) => write!(f, "nullable<{inner}>"),
        }
    }
}

/// One field of a schema: its name, declared type, and optional default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Value applied when the field is absent from a structural input.
    /// Nullable fields without an explicit default fall back to null.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldDescriptor {
    /// Create a descriptor without a default.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            default: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Returns true if a structural input must supply this field.
    pub fn is_required(&self) -> bool {
        self.default.is_none() && !self.field_type.is_nullable()
    }

    /// The value used when the field is absent, if any.
    pub fn default_value(&self) -> Option<Value> {
        match &self.default {
            Some(value) => Some(value.clone()),
            None if self.field_type.is_nullable() => Some(Value::Null),
            None => None,
        }
    }
}

/// Short name of the JSON kind of a value, used in error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
