//! Column binding registry.
//!
//! Built once at startup, then shared read-only (usually behind an `Arc`).
//! Record types form a single-inheritance hierarchy: a subtype sees every
//! column of its ancestors, and its own registration of a column overrides
//! the inherited one.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use typecol_schema::{FieldIssue, IssueKind, Schema, SchemaError, SchemaSerializer, TypedStruct};

use crate::cache::CachedValue;
use crate::column::Column;
use crate::error::{AttributeError, Result};

/// Type-erased serializer stored in a binding.
///
/// Lets generic accessor code and the persistence hook work with any
/// binding without knowing the concrete struct type.
trait ColumnCodec: Send + Sync {
    fn serialize(&self, value: &(dyn Any + Send + Sync)) -> std::result::Result<Value, SchemaError>;

    fn deserialize(&self, structural: &Value) -> std::result::Result<CachedValue, SchemaError>;
}

impl<S: TypedStruct> ColumnCodec for SchemaSerializer<S> {
    fn serialize(&self, value: &(dyn Any + Send + Sync)) -> std::result::Result<Value, SchemaError> {
        match value.downcast_ref::<S>() {
            Some(typed) => SchemaSerializer::<S>::serialize(self, typed),
            None => Err(SchemaError::Serialization {
                schema: self.schema().name().to_string(),
                issues: vec![FieldIssue::new(
                    "",
                    IssueKind::Serde(format!("cached value is not a {}", S::NAME)),
                )],
            }),
        }
    }

    fn deserialize(&self, structural: &Value) -> std::result::Result<CachedValue, SchemaError> {
        SchemaSerializer::<S>::deserialize(self, structural)
            .map(|typed| Box::new(typed) as CachedValue)
    }
}

/// Binding of one column to a typed struct and its schema.
pub struct ColumnBinding {
    record_type: String,
    column: String,
    schema: Arc<Schema>,
    struct_name: &'static str,
    struct_type: TypeId,
    codec: Box<dyn ColumnCodec>,
}

impl ColumnBinding {
    fn new<S: TypedStruct>(record_type: &str, column: &str, schema: Schema) -> Self {
        let schema = Arc::new(schema);
        Self {
            record_type: record_type.to_string(),
            column: column.to_string(),
            schema: Arc::clone(&schema),
            struct_name: S::NAME,
            struct_type: TypeId::of::<S>(),
            codec: Box::new(SchemaSerializer::<S>::new(schema)),
        }
    }

    /// Record type the binding was registered on (may be an ancestor).
    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn struct_name(&self) -> &'static str {
        self.struct_name
    }

    pub(crate) fn holds<S: 'static>(&self) -> bool {
        self.struct_type == TypeId::of::<S>()
    }

    pub(crate) fn serialize(&self, value: &(dyn Any + Send + Sync)) -> Result<Value> {
        self.codec
            .serialize(value)
            .map_err(|source| AttributeError::Serialization {
                column: self.column.clone(),
                source,
            })
    }

    pub(crate) fn deserialize(&self, structural: &Value) -> Result<CachedValue> {
        self.codec
            .deserialize(structural)
            .map_err(|source| AttributeError::Deserialization {
                column: self.column.clone(),
                source,
            })
    }
}

impl fmt::Debug for ColumnBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnBinding")
            .field("record_type", &self.record_type)
            .field("column", &self.column)
            .field("struct_name", &self.struct_name)
            .field("schema", &self.schema.name())
            .finish()
    }
}

#[derive(Debug, Default)]
struct RecordTypeEntry {
    parent: Option<String>,
    /// Own bindings in registration order.
    columns: Vec<Arc<ColumnBinding>>,
}

/// Registry of typed columns per record type.
#[derive(Debug, Default)]
pub struct BindingRegistry {
    types: BTreeMap<String, RecordTypeEntry>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a root record type.
    pub fn declare(&mut self, record_type: &str) -> Result<()> {
        self.insert_type(record_type, None)
    }

    /// Declare a record type inheriting every binding of `parent`.
    ///
    /// The parent must already be declared.
    pub fn declare_subtype(&mut self, record_type: &str, parent: &str) -> Result<()> {
        if !self.types.contains_key(parent) {
            return Err(AttributeError::UnknownRecordType(parent.to_string()));
        }
        self.insert_type(record_type, Some(parent.to_string()))
    }

    fn insert_type(&mut self, record_type: &str, parent: Option<String>) -> Result<()> {
        if self.types.contains_key(record_type) {
            return Err(AttributeError::DuplicateRecordType(record_type.to_string()));
        }
        debug!(record_type, parent = parent.as_deref(), "declared record type");
        self.types.insert(
            record_type.to_string(),
            RecordTypeEntry {
                parent,
                columns: Vec::new(),
            },
        );
        Ok(())
    }

    /// Bind `column` on `record_type` to the struct `S`.
    ///
    /// Registering a column that already exists on the same type replaces the
    /// earlier binding. An undeclared record type is declared as a root type.
    pub fn register<S: TypedStruct>(
        &mut self,
        record_type: &str,
        column: &Column<S>,
    ) -> Result<Arc<ColumnBinding>> {
        let schema = S::schema().map_err(|source| AttributeError::Schema {
            column: column.name().to_string(),
            source,
        })?;
        let binding = Arc::new(ColumnBinding::new::<S>(record_type, column.name(), schema));

        let entry = self.types.entry(record_type.to_string()).or_default();
        match entry
            .columns
            .iter()
            .position(|existing| existing.column == column.name())
        {
            Some(index) => entry.columns[index] = Arc::clone(&binding),
            None => entry.columns.push(Arc::clone(&binding)),
        }

        debug!(
            record_type,
            column = column.name(),
            struct_name = S::NAME,
            "registered typed column"
        );
        Ok(binding)
    }

    /// Find the binding for `column`, most specific record type first.
    ///
    /// A missing binding is a programming error in the caller, reported as
    /// [`AttributeError::UnregisteredColumn`].
    pub fn lookup(&self, record_type: &str, column: &str) -> Result<&Arc<ColumnBinding>> {
        if !self.types.contains_key(record_type) {
            return Err(AttributeError::UnknownRecordType(record_type.to_string()));
        }
        self.ancestry(record_type)
            .find_map(|entry| entry.columns.iter().find(|binding| binding.column == column))
            .ok_or_else(|| AttributeError::UnregisteredColumn {
                record_type: record_type.to_string(),
                column: column.to_string(),
            })
    }

    /// Every binding visible on `record_type`.
    ///
    /// Inherited columns come first, in the order the root declared them;
    /// an override keeps its ancestor's position. Undeclared types have none.
    pub fn bindings(&self, record_type: &str) -> Vec<Arc<ColumnBinding>> {
        let mut lineage: Vec<&RecordTypeEntry> = self.ancestry(record_type).collect();
        lineage.reverse();

        let mut bindings: Vec<Arc<ColumnBinding>> = Vec::new();
        for entry in lineage {
            for binding in &entry.columns {
                match bindings.iter().position(|b| b.column == binding.column) {
                    Some(index) => bindings[index] = Arc::clone(binding),
                    None => bindings.push(Arc::clone(binding)),
                }
            }
        }
        bindings
    }

    /// Declared record types, sorted by name.
    pub fn record_types(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn is_declared(&self, record_type: &str) -> bool {
        self.types.contains_key(record_type)
    }

    pub fn parent(&self, record_type: &str) -> Option<&str> {
        self.types.get(record_type)?.parent.as_deref()
    }

    /// Entries from `record_type` up to its root.
    fn ancestry<'a>(
        &'a self,
        record_type: &str,
    ) -> impl Iterator<Item = &'a RecordTypeEntry> + use<'a> {
        let mut next = self.types.get(record_type);
        std::iter::from_fn(move || {
            let entry = next?;
            next = entry
                .parent
                .as_deref()
                .and_then(|parent| self.types.get(parent));
            Some(entry)
        })
    }
}
