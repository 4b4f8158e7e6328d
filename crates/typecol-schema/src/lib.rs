//! Schemas for typed JSON columns.
//!
//! A [`Schema`] describes the fields of a typed struct: their names, declared
//! types and defaults. A [`SchemaSerializer`] uses it to convert between
//! structural values (`serde_json::Value` objects, as stored in a column) and
//! instances of a [`TypedStruct`].
//!
//! Deserialization is forgiving on purpose: absent fields take their default,
//! unknown keys are ignored, and obviously-intended scalars (`"16"` for an
//! integer) are coerced. Serialization is strict, since a struct that no
//! longer fits its schema must never reach storage.
//!
//! # Example
//!
//! ```ignore
//! use typecol_schema::{FieldType, Schema};
//!
//! let schema = Schema::builder("UserSettings")
//!     .optional("theme", FieldType::String, "light")
//!     .optional("font_size", FieldType::Integer, 14)
//!     .build()?;
//!
//! let normalized = schema.normalize(&serde_json::json!({"theme": "dark"}))?;
//! assert_eq!(normalized["font_size"], 14);
//! ```

mod coerce;
mod error;
mod field;
mod schema;
mod serializer;

pub use error::{FieldIssue, IssueKind, Result, SchemaError};
pub use field::{FieldDescriptor, FieldType, json_kind};
pub use schema::{Schema, SchemaBuilder};
pub use serializer::{SchemaSerializer, TypedStruct};
