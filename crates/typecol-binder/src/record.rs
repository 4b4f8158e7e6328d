//! Boundary with the persistence engine.

use serde_json::Value;

use crate::cache::AttributeCache;

/// Raw column value as handed over by the persistence engine.
///
/// Engines that keep JSON columns as text hand the text over unparsed; the
/// binder parses it on first read.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Structured(Value),
    Text(String),
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

impl From<String> for RawValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// A persisted record instance with typed columns.
///
/// Implemented by the persistence engine's record type. The engine must call
/// [`AttributeBinder::before_persist`](crate::AttributeBinder::before_persist)
/// before every durable write and [`AttributeCache::clear_all`] whenever the
/// record is reloaded from storage.
pub trait Record {
    /// Name of the record type, as declared in the registry.
    fn record_type(&self) -> &str;

    /// Current raw value of a column. `None` means SQL NULL or never set.
    fn read_raw(&self, column: &str) -> Option<RawValue>;

    /// Stage a column value without forcing durability.
    fn write_raw(&mut self, column: &str, value: Option<Value>);

    fn attribute_cache(&self) -> &AttributeCache;

    fn attribute_cache_mut(&mut self) -> &mut AttributeCache;
}
