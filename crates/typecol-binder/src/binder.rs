//! Read, assignment, and pre-persist entry points for typed columns.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace, warn};
use typecol_schema::{FieldIssue, IssueKind, SchemaError, TypedStruct, json_kind};

use crate::cache::{CachedValue, SlotState};
use crate::column::{Assignment, Column};
use crate::error::{AttributeError, Result};
use crate::record::{RawValue, Record};
use crate::registry::{BindingRegistry, ColumnBinding};

/// Generic accessor logic shared by every typed column.
///
/// Holds the registry; all per-instance state lives in the record's
/// [`AttributeCache`](crate::AttributeCache).
#[derive(Debug, Clone)]
pub struct AttributeBinder {
    registry: Arc<BindingRegistry>,
}

impl AttributeBinder {
    pub fn new(registry: Arc<BindingRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<BindingRegistry> {
        &self.registry
    }

    /// Read a typed column.
    ///
    /// The first read deserializes the raw column value and caches it; later
    /// reads return the cached struct itself, so changes made through the
    /// returned reference are seen by the next read and flushed by
    /// [`AttributeBinder::before_persist`]. Returns `None` when the column is nil.
    pub fn read<'r, S, R>(&self, record: &'r mut R, column: &Column<S>) -> Result<Option<&'r mut S>>
    where
        S: TypedStruct,
        R: Record + ?Sized,
    {
        let binding = self.typed_binding(record.record_type(), column)?;
        let name = binding.column();

        if record.attribute_cache().get(name).is_unloaded() {
            let loaded = load(&binding, record.read_raw(name))?;
            debug!(
                record_type = record.record_type(),
                column = name,
                nil = loaded.is_none(),
                "loaded typed column"
            );
            record.attribute_cache_mut().set(name, loaded);
        } else {
            trace!(column = name, "typed column cache hit");
        }

        match record.attribute_cache_mut().loaded_mut(name) {
            Some(cached) => (**cached).downcast_mut::<S>().map(Some).ok_or_else(|| {
                AttributeError::ColumnTypeMismatch {
                    record_type: binding.record_type().to_string(),
                    column: name.to_string(),
                    bound: binding.struct_name(),
                    requested: S::NAME,
                }
            }),
            None => Ok(None),
        }
    }

    /// Assign a typed column.
    ///
    /// Typed and structural values are validated and encoded before anything
    /// is written; on failure the record is left untouched. A structural map
    /// is deserialized and re-serialized, so the cache holds the normalized
    /// struct, not the input map. Nil writes a NULL and unloads the slot.
    pub fn assign<S, R>(&self, record: &mut R, column: &Column<S>, value: Assignment<S>) -> Result<()>
    where
        S: TypedStruct,
        R: Record + ?Sized,
    {
        let binding = self.typed_binding(record.record_type(), column)?;
        let name = binding.column();

        match value {
            Assignment::Typed(typed) => {
                let encoded = binding.serialize(&typed)?;
                record.write_raw(name, Some(encoded));
                record.attribute_cache_mut().set(name, Some(Box::new(typed)));
                debug!(column = name, "assigned typed struct");
            }
            Assignment::Structural(structural @ Value::Object(_)) => {
                let typed = binding.deserialize(&structural)?;
                let encoded = binding.serialize(&*typed)?;
                record.write_raw(name, Some(encoded));
                record.attribute_cache_mut().set(name, Some(typed));
                debug!(column = name, "assigned structural map");
            }
            Assignment::Structural(Value::Null) | Assignment::Nil => {
                record.write_raw(name, None);
                record.attribute_cache_mut().clear(name);
                debug!(column = name, "assigned nil");
            }
            Assignment::Structural(other) => {
                return Err(AttributeError::InvalidAssignmentShape {
                    column: name.to_string(),
                    expected: S::NAME,
                    actual: json_kind(&other),
                });
            }
        }
        Ok(())
    }

    /// Flush cached typed values back into their columns.
    ///
    /// The persistence engine calls this right before a durable write. Every
    /// loaded, non-nil slot is re-serialized so in-place changes to cached
    /// structs are persisted. Encoding happens for all columns before any is
    /// written: if one fails, nothing is written and the error is returned.
    ///
    /// Returns the number of columns written.
    pub fn before_persist<R>(&self, record: &mut R) -> Result<usize>
    where
        R: Record + ?Sized,
    {
        let bindings = self.registry.bindings(record.record_type());

        let mut staged = Vec::new();
        for binding in &bindings {
            let SlotState::Loaded(Some(cached)) = record.attribute_cache().get(binding.column())
            else {
                continue;
            };
            match binding.serialize(cached) {
                Ok(encoded) => staged.push((binding.column(), encoded)),
                Err(error) => {
                    warn!(
                        record_type = record.record_type(),
                        column = binding.column(),
                        %error,
                        "aborting flush of typed columns"
                    );
                    return Err(error);
                }
            }
        }

        let flushed = staged.len();
        for (column, encoded) in staged {
            record.write_raw(column, Some(encoded));
        }
        debug!(
            record_type = record.record_type(),
            flushed, "flushed typed columns"
        );
        Ok(flushed)
    }

    fn typed_binding<S: TypedStruct>(
        &self,
        record_type: &str,
        column: &Column<S>,
    ) -> Result<Arc<ColumnBinding>> {
        let binding = self.registry.lookup(record_type, column.name())?;
        if !binding.holds::<S>() {
            return Err(AttributeError::ColumnTypeMismatch {
                record_type: record_type.to_string(),
                column: column.name().to_string(),
                bound: binding.struct_name(),
                requested: S::NAME,
            });
        }
        Ok(Arc::clone(binding))
    }
}

/// Turn a raw column value into a cached typed value.
fn load(binding: &ColumnBinding, raw: Option<RawValue>) -> Result<Option<CachedValue>> {
    let structural = match raw {
        None => return Ok(None),
        Some(RawValue::Structured(value)) => value,
        Some(RawValue::Text(text)) => {
            serde_json::from_str(&text).map_err(|e| AttributeError::Deserialization {
                column: binding.column().to_string(),
                source: SchemaError::Deserialization {
                    schema: binding.schema().name().to_string(),
                    issues: vec![FieldIssue::new(
                        "",
                        IssueKind::Serde(format!("invalid JSON: {e}")),
                    )],
                },
            })?
        }
    };

    if structural.is_null() {
        return Ok(None);
    }
    binding.deserialize(&structural).map(Some)
}
