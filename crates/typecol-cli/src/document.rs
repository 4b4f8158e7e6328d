//! Schema files and document normalization.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table, modifiers::UTF8_ROUND_CORNERS};
use serde_json::{Map, Value};
use tracing::debug;
use typecol_schema::{Schema, SchemaError};

/// Read and validate a JSON schema file.
pub fn load_schema(path: &Path) -> Result<Schema> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read schema file {}", path.display()))?;
    let schema =
        Schema::from_json(&text).with_context(|| format!("parse schema file {}", path.display()))?;
    debug!(schema = schema.name(), fields = schema.len(), "loaded schema");
    Ok(schema)
}

/// Canonical form of a structural document.
///
/// Runs the same two steps a typed column does on assignment: coerce and
/// default the input, then check the result strictly.
pub fn normalize_document(schema: &Schema, input: &Value) -> Result<Map<String, Value>, SchemaError> {
    let normalized = schema.normalize(input)?;
    schema.validate(&Value::Object(normalized))
}

/// Parse input document text.
pub fn parse_document(text: &str) -> Result<Value> {
    serde_json::from_str(text).context("parse input document")
}

/// Table of a schema's fields: name, type, and default or "required".
pub fn fields_table(schema: &Schema) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Field", "Type", "Default"]);
    apply_table_style(&mut table);
    for field in schema.fields() {
        let default = match field.default_value() {
            Some(value) => value.to_string(),
            None => "(required)".to_string(),
        };
        table.add_row(vec![field.name.clone(), field.field_type.to_string(), default]);
    }
    table
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use typecol_schema::FieldType;

    fn settings() -> Schema {
        Schema::builder("UserSettings")
            .optional("theme", FieldType::String, "light")
            .required("font_size", FieldType::Integer)
            .build()
            .unwrap()
    }

    #[test]
    fn test_normalize_applies_defaults_and_coercion() {
        let normalized = normalize_document(&settings(), &json!({"font_size": "12"})).unwrap();
        assert_eq!(Value::Object(normalized), json!({"theme": "light", "font_size": 12}));
    }

    #[test]
    fn test_normalize_reports_missing_field() {
        let error = normalize_document(&settings(), &json!({})).unwrap_err();
        assert_eq!(error.offending_fields(), vec!["font_size"]);
    }

    #[test]
    fn test_fields_table_rows() {
        let table = fields_table(&settings());
        assert_eq!(table.row_count(), 2);
        let rendered = table.to_string();
        assert!(rendered.contains("(required)"));
        assert!(rendered.contains("\"light\""));
    }

    #[test]
    fn test_parse_document_rejects_garbage() {
        assert!(parse_document("{nope").is_err());
    }
}
