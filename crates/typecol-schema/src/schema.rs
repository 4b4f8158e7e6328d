//! Schemas: named, ordered sets of field descriptors.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::coerce::{Mode, child_path, conform, empty_object};
use crate::error::{FieldIssue, IssueKind, Result, SchemaError};
use crate::field::{FieldDescriptor, FieldType, json_kind};

/// Shape of a typed struct.
///
/// A schema is immutable once built. Construct one with [`Schema::builder`]
/// or deserialize it from JSON; both paths validate field names and defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSchema")]
pub struct Schema {
    name: String,
    fields: Vec<FieldDescriptor>,
}

#[derive(Deserialize)]
struct RawSchema {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl TryFrom<RawSchema> for Schema {
    type Error = SchemaError;

    fn try_from(raw: RawSchema) -> Result<Self> {
        Schema::builder(raw.name).fields(raw.fields).build()
    }
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Parse and validate a schema from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| SchemaError::Definition {
            schema: "<unnamed>".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field descriptors in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Normalize a structural value for deserialization.
    ///
    /// Present fields are coerced to their declared type, absent (or null)
    /// fields receive their default, and keys the schema does not declare are
    /// dropped. The result contains exactly the declared fields.
    pub fn normalize(&self, input: &Value) -> Result<Map<String, Value>> {
        let Value::Object(map) = input else {
            return Err(self.deserialization(vec![FieldIssue::new(
                "",
                IssueKind::NotAnObject {
                    actual: json_kind(input),
                },
            )]));
        };

        let mut issues = Vec::new();
        self.conform_object(map, "", Mode::Coerce, &mut issues)
            .ok_or_else(|| self.deserialization(issues))
    }

    /// Check an encoded struct before it is written to storage.
    ///
    /// Unlike [`Schema::normalize`] nothing is coerced or defaulted: every
    /// declared field must already hold a value of its declared type. Nullable
    /// fields may be omitted. Undeclared keys are dropped from the canonical form.
    pub fn validate(&self, encoded: &Value) -> Result<Map<String, Value>> {
        let Value::Object(map) = encoded else {
            return Err(self.serialization(vec![FieldIssue::new(
                "",
                IssueKind::NotAnObject {
                    actual: json_kind(encoded),
                },
            )]));
        };

        let mut issues = Vec::new();
        self.conform_object(map, "", Mode::Strict, &mut issues)
            .ok_or_else(|| self.serialization(issues))
    }

    /// The document produced by normalizing `{}`.
    ///
    /// Fails when the schema has required fields.
    pub fn defaults(&self) -> Result<Map<String, Value>> {
        self.normalize(&Value::Object(empty_object()))
    }

    pub(crate) fn conform_object(
        &self,
        map: &Map<String, Value>,
        prefix: &str,
        mode: Mode,
        issues: &mut Vec<FieldIssue>,
    ) -> Option<Map<String, Value>> {
        let before = issues.len();
        let mut out = Map::new();

        for field in &self.fields {
            let path = child_path(prefix, &field.name);
            let supplied = match mode {
                Mode::Coerce => map.get(&field.name).filter(|value| !value.is_null()),
                Mode::Strict => map.get(&field.name),
            };

            let value = match supplied {
                Some(value) => conform(&field.field_type, value, &path, mode, issues),
                None => {
                    let fallback = match mode {
                        Mode::Coerce => field.default_value(),
                        Mode::Strict => field.field_type.is_nullable().then_some(Value::Null),
                    };
                    if fallback.is_none() {
                        issues.push(FieldIssue::new(path, IssueKind::Missing));
                    }
                    fallback
                }
            };

            if let Some(value) = value {
                out.insert(field.name.clone(), value);
            }
        }

        (issues.len() == before).then_some(out)
    }

    fn deserialization(&self, issues: Vec<FieldIssue>) -> SchemaError {
        SchemaError::Deserialization {
            schema: self.name.clone(),
            issues,
        }
    }

    fn serialization(&self, issues: Vec<FieldIssue>) -> SchemaError {
        SchemaError::Serialization {
            schema: self.name.clone(),
            issues,
        }
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl SchemaBuilder {
    #[must_use]
    pub fn field(mut self, descriptor: FieldDescriptor) -> Self {
        self.fields.push(descriptor);
        self
    }

    #[must_use]
    pub fn fields(mut self, descriptors: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        self.fields.extend(descriptors);
        self
    }

    /// Add a field that structural inputs must supply.
    #[must_use]
    pub fn required(self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.field(FieldDescriptor::new(name, field_type))
    }

    /// Add a field with a default value.
    #[must_use]
    pub fn optional(
        self,
        name: impl Into<String>,
        field_type: FieldType,
        default: impl Into<Value>,
    ) -> Self {
        self.field(FieldDescriptor::new(name, field_type).with_default(default))
    }

    /// Validate and build the schema.
    ///
    /// Field names must be non-empty and unique, and every default must
    /// already satisfy its field's type. Defaults are stored in canonical form.
    pub fn build(self) -> Result<Schema> {
        let definition_error = |reason: String| SchemaError::Definition {
            schema: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(definition_error("schema name is empty".to_string()));
        }

        let mut seen = BTreeSet::new();
        let mut fields = Vec::with_capacity(self.fields.len());
        for mut field in self.fields.iter().cloned() {
            if field.name.is_empty() {
                return Err(definition_error("field name is empty".to_string()));
            }
            if !seen.insert(field.name.clone()) {
                return Err(definition_error(format!(
                    "field '{}' is declared more than once",
                    field.name
                )));
            }
            if let Some(default) = field.default.take() {
                let mut issues = Vec::new();
                let canonical =
                    conform(&field.field_type, &default, &field.name, Mode::Strict, &mut issues);
                match canonical {
                    Some(value) => field.default = Some(value),
                    None => {
                        return Err(definition_error(format!(
                            "default for '{}' does not match {}: {}",
                            field.name, field.field_type, issues[0]
                        )));
                    }
                }
            }
            fields.push(field);
        }

        Ok(Schema {
            name: self.name,
            fields,
        })
    }
}
