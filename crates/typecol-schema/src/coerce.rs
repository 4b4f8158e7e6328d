//! Conforming JSON values to declared field types.
//!
//! Deserialization is lenient: numeric strings become numbers, `"true"`
//! becomes a boolean, and so on. Serialization is strict: the value must
//! already have the declared type. In both modes the output is the canonical
//! form stored in a column.

use serde_json::{Map, Number, Value};

use crate::error::{FieldIssue, IssueKind};
use crate::field::{FieldType, json_kind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Structural input on its way to a typed struct.
    Coerce,
    /// Encoded struct on its way to storage.
    Strict,
}

/// Conform `value` to `field_type`, recording every problem in `issues`.
///
/// Returns `None` when at least one issue was recorded for this value.
pub(crate) fn conform(
    field_type: &FieldType,
    value: &Value,
    path: &str,
    mode: Mode,
    issues: &mut Vec<FieldIssue>,
) -> Option<Value> {
    let conformed = match (field_type, value) {
        (FieldType::Any, _) => Some(value.clone()),
        (FieldType::Nullable(_), Value::Null) => Some(Value::Null),
        (FieldType::Nullable(inner), _) => return conform(inner, value, path, mode, issues),
        (FieldType::String, Value::String(_)) => Some(value.clone()),
        (FieldType::Integer, _) => integer(value, mode),
        (FieldType::Float, _) => float(value, mode),
        (FieldType::Boolean, _) => boolean(value, mode),
        (FieldType::Array(element), Value::Array(items)) => {
            return array(element, items, path, mode, issues);
        }
        (FieldType::Object(schema), Value::Object(map)) => {
            return schema.conform_object(map, path, mode, issues).map(Value::Object);
        }
        _ => None,
    };

    if conformed.is_none() {
        issues.push(FieldIssue::new(
            path,
            IssueKind::TypeMismatch {
                expected: field_type.to_string(),
                actual: json_kind(value),
            },
        ));
    }
    conformed
}

fn integer(value: &Value, mode: Mode) -> Option<Value> {
    match value {
        Value::Number(n) if n.is_i64() => Some(value.clone()),
        Value::Number(n) if mode == Mode::Coerce => {
            let f = n.as_f64()?;
            // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
            (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64)
                .then(|| Value::from(f as i64))
        }
        Value::String(s) if mode == Mode::Coerce => s.trim().parse::<i64>().ok().map(Value::from),
        _ => None,
    }
}

fn float(value: &Value, mode: Mode) -> Option<Value> {
    match (value, mode) {
        (Value::Number(_), Mode::Strict) => Some(value.clone()),
        (Value::Number(n), Mode::Coerce) => n.as_f64().and_then(Number::from_f64).map(Value::Number),
        (Value::String(s), Mode::Coerce) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        _ => None,
    }
}

fn boolean(value: &Value, mode: Mode) -> Option<Value> {
    match (value, mode) {
        (Value::Bool(_), _) => Some(value.clone()),
        (Value::String(s), Mode::Coerce) => match s.trim() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn array(
    element: &FieldType,
    items: &[Value],
    path: &str,
    mode: Mode,
    issues: &mut Vec<FieldIssue>,
) -> Option<Value> {
    let before = issues.len();
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let item_path = format!("{path}[{index}]");
        if let Some(conformed) = conform(element, item, &item_path, mode, issues) {
            out.push(conformed);
        }
    }
    (issues.len() == before).then_some(Value::Array(out))
}

/// Join a parent path and a field name into a dotted path.
pub(crate) fn child_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Empty object, used as the structural form of "no keys supplied".
pub(crate) fn empty_object() -> Map<String, Value> {
    Map::new()
}
