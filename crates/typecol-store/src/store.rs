//! The record store.

use std::collections::BTreeMap;

use tracing::{debug, info};
use typecol_binder::{Assignment, AttributeBinder, AttributeError, Column, Record};
use typecol_schema::TypedStruct;

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::io::{load_snapshot, save_snapshot};
use crate::row::Row;
use crate::snapshot::{Snapshot, StoredRow, Table};

/// Tables of rows whose typed columns are handled by an [`AttributeBinder`].
///
/// Every save runs the binder's pre-persist hook first, so in-place changes
/// to cached structs are written along with explicit assignments.
#[derive(Debug)]
pub struct Store {
    binder: AttributeBinder,
    config: StoreConfig,
    tables: BTreeMap<String, Table>,
    next_id: u64,
}

impl Store {
    /// In-memory store.
    pub fn new(binder: AttributeBinder) -> Self {
        Self {
            binder,
            config: StoreConfig::in_memory(),
            tables: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Store with the given configuration, loading the snapshot file if it exists.
    pub fn open(binder: AttributeBinder, config: StoreConfig) -> Result<Self> {
        let mut store = Self {
            config,
            ..Self::new(binder)
        };

        if let Some(path) = store.config.path.as_deref().filter(|p| p.exists()) {
            let snapshot = load_snapshot(path)?;
            let after_stored = snapshot
                .tables
                .values()
                .filter_map(|table| table.last_key_value())
                .map(|(id, _)| id + 1)
                .max()
                .unwrap_or(1);
            store.next_id = snapshot.next_id.max(after_stored);
            store.tables = snapshot.tables;
        }
        Ok(store)
    }

    pub fn binder(&self) -> &AttributeBinder {
        &self.binder
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// New unsaved row of a declared record type.
    pub fn build(&self, record_type: &str) -> Result<Row> {
        if !self.binder.registry().is_declared(record_type) {
            return Err(AttributeError::UnknownRecordType(record_type.to_string()).into());
        }
        Ok(Row::new(record_type))
    }

    /// Build a row, let `init` assign its columns, and save it.
    pub fn create<F>(&mut self, record_type: &str, init: F) -> Result<Row>
    where
        F: FnOnce(&AttributeBinder, &mut Row) -> typecol_binder::Result<()>,
    {
        let mut row = self.build(record_type)?;
        init(&self.binder, &mut row)?;
        self.save(&mut row)?;
        Ok(row)
    }

    /// Commit a row.
    ///
    /// Flushes cached typed values first; if any column fails to encode the
    /// save is aborted and nothing is committed. New rows get an id. The
    /// snapshot is written before the in-memory commit; a failed write leaves
    /// the store and the row's id unchanged.
    pub fn save(&mut self, row: &mut Row) -> Result<()> {
        let flushed = self.binder.before_persist(row)?;
        let stored = row.encode()?;

        let (id, next_id) = match row.id() {
            Some(id) => (id, self.next_id),
            None => (self.next_id, self.next_id + 1),
        };

        let mut tables = self.tables.clone();
        tables
            .entry(row.record_type().to_string())
            .or_default()
            .insert(id, stored.clone());

        if let Some(path) = self.config.path.as_deref() {
            let mut snapshot = Snapshot::new(next_id, tables);
            save_snapshot(&mut snapshot, path, self.config.pretty)?;
            tables = snapshot.tables;
        }

        self.tables = tables;
        self.next_id = next_id;
        row.set_id(id);
        row.replace_columns(&stored);
        info!(record_type = row.record_type(), id, flushed, "saved row");
        Ok(())
    }

    /// Fresh copy of a stored row, with an empty cache.
    pub fn find(&self, record_type: &str, id: u64) -> Result<Row> {
        let stored = self.stored(record_type, id)?;
        debug!(record_type, id, "found row");
        Ok(Row::from_stored(record_type, id, stored))
    }

    /// Re-read a row's columns from storage and drop every cached struct.
    pub fn reload(&self, row: &mut Row) -> Result<()> {
        let id = row.id().ok_or_else(|| StoreError::NotPersisted {
            record_type: row.record_type().to_string(),
        })?;
        let stored = self.stored(row.record_type(), id)?;
        row.replace_columns(stored);
        row.attribute_cache_mut().clear_all();
        info!(record_type = row.record_type(), id, "reloaded row");
        Ok(())
    }

    /// Typed read of a column.
    pub fn attribute<'r, S: TypedStruct>(
        &self,
        row: &'r mut Row,
        column: &Column<S>,
    ) -> Result<Option<&'r mut S>> {
        Ok(self.binder.read(row, column)?)
    }

    /// Typed assignment of a column. Not committed until [`Store::save`].
    pub fn assign<S: TypedStruct>(
        &self,
        row: &mut Row,
        column: &Column<S>,
        value: impl Into<Assignment<S>>,
    ) -> Result<()> {
        Ok(self.binder.assign(row, column, value.into())?)
    }

    /// Number of saved rows of a record type.
    pub fn count(&self, record_type: &str) -> usize {
        self.tables.get(record_type).map_or(0, Table::len)
    }

    /// Committed text of a column, `None` for NULL.
    pub fn stored_text(&self, record_type: &str, id: u64, column: &str) -> Result<Option<&str>> {
        Ok(self
            .stored(record_type, id)?
            .get(column)
            .map(String::as_str))
    }

    fn stored(&self, record_type: &str, id: u64) -> Result<&StoredRow> {
        self.tables
            .get(record_type)
            .and_then(|table| table.get(&id))
            .ok_or_else(|| StoreError::RecordNotFound {
                record_type: record_type.to_string(),
                id,
            })
    }
}
