//! In-memory row of a record type.

use std::collections::BTreeMap;

use serde_json::Value;
use typecol_binder::{AttributeCache, RawValue, Record};

use crate::error::{Result, StoreError};
use crate::snapshot::StoredRow;

/// A row loaded from, or about to be saved to, a [`Store`](crate::Store).
///
/// Column values fetched from storage stay as JSON text until first read;
/// values staged by assignments are structured JSON.
#[derive(Debug)]
pub struct Row {
    record_type: String,
    id: Option<u64>,
    columns: BTreeMap<String, RawValue>,
    cache: AttributeCache,
}

impl Row {
    pub(crate) fn new(record_type: &str) -> Self {
        Self {
            record_type: record_type.to_string(),
            id: None,
            columns: BTreeMap::new(),
            cache: AttributeCache::new(),
        }
    }

    pub(crate) fn from_stored(record_type: &str, id: u64, stored: &StoredRow) -> Self {
        let mut row = Self::new(record_type);
        row.id = Some(id);
        row.replace_columns(stored);
        row
    }

    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// Whether the row has been saved at least once.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Column value as it would be written to storage, `None` for NULL.
    pub fn column_text(&self, column: &str) -> Option<String> {
        match self.columns.get(column)? {
            RawValue::Text(text) => Some(text.clone()),
            RawValue::Structured(value) => Some(value.to_string()),
        }
    }

    pub fn cache(&self) -> &AttributeCache {
        &self.cache
    }

    pub(crate) fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    /// Encode every column to text, the way it is committed.
    pub(crate) fn encode(&self) -> Result<StoredRow> {
        self.columns
            .iter()
            .map(|(column, raw)| {
                let text = match raw {
                    RawValue::Text(text) => text.clone(),
                    RawValue::Structured(value) => serde_json::to_string(value)
                        .map_err(|source| StoreError::Serialization { source })?,
                };
                Ok((column.clone(), text))
            })
            .collect()
    }

    /// Replace column values with committed text. Leaves the cache alone.
    pub(crate) fn replace_columns(&mut self, stored: &StoredRow) {
        self.columns = stored
            .iter()
            .map(|(column, text)| (column.clone(), RawValue::Text(text.clone())))
            .collect();
    }
}

impl Record for Row {
    fn record_type(&self) -> &str {
        &self.record_type
    }

    fn read_raw(&self, column: &str) -> Option<RawValue> {
        self.columns.get(column).cloned()
    }

    fn write_raw(&mut self, column: &str, value: Option<Value>) {
        match value {
            Some(value) => {
                self.columns
                    .insert(column.to_string(), RawValue::Structured(value));
            }
            None => {
                self.columns.remove(column);
            }
        }
    }

    fn attribute_cache(&self) -> &AttributeCache {
        &self.cache
    }

    fn attribute_cache_mut(&mut self) -> &mut AttributeCache {
        &mut self.cache
    }
}
