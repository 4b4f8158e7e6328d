//! Conversion between structural values and typed structs.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{FieldIssue, IssueKind, Result, SchemaError};
use crate::schema::Schema;

/// A Rust struct whose shape is described by a [`Schema`].
///
/// The struct's serde representation must agree with the schema: the field
/// names match and every field's serde encoding is a value of the declared
/// type.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// struct UserSettings {
///     theme: String,
///     font_size: i64,
/// }
///
/// impl TypedStruct for UserSettings {
///     const NAME: &'static str = "UserSettings";
///
///     fn schema() -> typecol_schema::Result<Schema> {
///         Schema::builder(Self::NAME)
///             .optional("theme", FieldType::String, "light")
///             .optional("font_size", FieldType::Integer, 14)
///             .build()
///     }
/// }
/// ```
pub trait TypedStruct: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Name used in error messages and introspection.
    const NAME: &'static str;

    /// Build the schema describing this struct.
    fn schema() -> Result<Schema>;
}

/// Converts between structural JSON values and instances of `S`.
///
/// Both directions are pure: no I/O and no caching.
pub struct SchemaSerializer<S> {
    schema: Arc<Schema>,
    _marker: PhantomData<fn() -> S>,
}

impl<S: TypedStruct> SchemaSerializer<S> {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            _marker: PhantomData,
        }
    }

    /// Build a serializer from `S::schema()`.
    pub fn for_struct() -> Result<Self> {
        Ok(Self::new(Arc::new(S::schema()?)))
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Encode `value` into its canonical storage form.
    ///
    /// The encoded object is checked strictly against the schema, so a struct
    /// whose fields no longer fit (a non-finite float, for instance) is
    /// rejected here instead of reaching storage.
    pub fn serialize(&self, value: &S) -> Result<Value> {
        let encoded = serde_json::to_value(value).map_err(|e| SchemaError::Serialization {
            schema: self.schema.name().to_string(),
            issues: vec![FieldIssue::new("", IssueKind::Serde(e.to_string()))],
        })?;
        self.schema.validate(&encoded).map(Value::Object)
    }

    /// Build a typed struct from a structural value.
    ///
    /// Missing fields take their defaults and unknown keys are ignored; see
    /// [`Schema::normalize`].
    pub fn deserialize(&self, structural: &Value) -> Result<S> {
        let normalized = self.schema.normalize(structural)?;
        serde_json::from_value(Value::Object(normalized)).map_err(|e| {
            SchemaError::Deserialization {
                schema: self.schema.name().to_string(),
                issues: vec![FieldIssue::new("", IssueKind::Serde(e.to_string()))],
            }
        })
    }
}

impl<S> Clone for SchemaSerializer<S> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            _marker: PhantomData,
        }
    }
}

impl<S> fmt::Debug for SchemaSerializer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaSerializer")
            .field("schema", &self.schema.name())
            .field("struct", &std::any::type_name::<S>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldType;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Gauge {
        label: String,
        reading: f64,
    }

    impl TypedStruct for Gauge {
        const NAME: &'static str = "Gauge";

        fn schema() -> Result<Schema> {
            Schema::builder(Self::NAME)
                .required("label", FieldType::String)
                .optional("reading", FieldType::Float, 0.0)
                .build()
        }
    }

    #[test]
    fn test_serialize_rejects_non_finite_float() {
        let serializer = SchemaSerializer::<Gauge>::for_struct().unwrap();
        let gauge = Gauge {
            label: "pressure".to_string(),
            reading: f64::NAN,
        };
        let error = serializer.serialize(&gauge).unwrap_err();
        assert!(matches!(error, SchemaError::Serialization { .. }));
        assert_eq!(error.offending_fields(), vec!["reading"]);
    }

    #[test]
    fn test_deserialize_coerces_integer_reading() {
        let serializer = SchemaSerializer::<Gauge>::for_struct().unwrap();
        let gauge = serializer
            .deserialize(&json!({"label": "temp", "reading": 21}))
            .unwrap();
        assert_eq!(gauge.reading, 21.0);
    }

    #[test]
    fn test_deserialize_reports_serde_mismatch() {
        // Schema and struct disagree: the struct needs `label`, the schema lets it be null.
        #[derive(Debug, Serialize, Deserialize)]
        struct Loose {
            label: String,
        }

        impl TypedStruct for Loose {
            const NAME: &'static str = "Loose";

            fn schema() -> Result<Schema> {
                Schema::builder(Self::NAME)
                    .field(crate::FieldDescriptor::new(
                        "label",
                        FieldType::nullable(FieldType::String),
                    ))
                    .build()
            }
        }

        let serializer = SchemaSerializer::<Loose>::for_struct().unwrap();
        let error = serializer.deserialize(&json!({})).unwrap_err();
        assert!(matches!(
            error.issues()[0].kind,
            IssueKind::Serde(_)
        ));
    }
}
