//! Per-record cache of deserialized typed values.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Boxed typed struct held by a cache slot.
pub type CachedValue = Box<dyn Any + Send + Sync>;

/// State of one column's cache slot.
#[derive(Clone, Copy)]
pub enum SlotState<'a> {
    /// Nothing read or assigned since the record was loaded.
    Unloaded,
    /// Read or assigned; `None` when the column holds nil.
    Loaded(Option<&'a (dyn Any + Send + Sync)>),
}

impl<'a> SlotState<'a> {
    #[inline]
    pub fn is_unloaded(&self) -> bool {
        matches!(self, Self::Unloaded)
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        !self.is_unloaded()
    }

    /// The cached value, if loaded and not nil.
    pub fn value(&self) -> Option<&'a (dyn Any + Send + Sync)> {
        match self {
            Self::Loaded(value) => *value,
            Self::Unloaded => None,
        }
    }
}

impl fmt::Debug for SlotState<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unloaded => f.write_str("Unloaded"),
            Self::Loaded(None) => f.write_str("Loaded(nil)"),
            Self::Loaded(Some(_)) => f.write_str("Loaded(value)"),
        }
    }
}

/// Cache slots of a single record instance, keyed by column.
///
/// A column without an entry is unloaded. An entry of `None` is a column
/// that was loaded as nil.
#[derive(Default)]
pub struct AttributeCache {
    slots: HashMap<String, Option<CachedValue>>,
}

impl AttributeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> SlotState<'_> {
        match self.slots.get(column) {
            None => SlotState::Unloaded,
            Some(value) => SlotState::Loaded(value.as_deref()),
        }
    }

    /// Typed view of a loaded, non-nil slot.
    pub fn peek<S: 'static>(&self, column: &str) -> Option<&S> {
        self.get(column).value()?.downcast_ref::<S>()
    }

    /// Mark the slot loaded with `value`.
    pub fn set(&mut self, column: &str, value: Option<CachedValue>) {
        self.slots.insert(column.to_string(), value);
    }

    /// Return the slot to unloaded.
    pub fn clear(&mut self, column: &str) {
        self.slots.remove(column);
    }

    /// Return every slot to unloaded, dropping the cached values.
    pub fn clear_all(&mut self) {
        self.slots.clear();
    }

    /// Columns whose slot is loaded (nil included), sorted.
    pub fn loaded_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = self.slots.keys().map(String::as_str).collect();
        columns.sort_unstable();
        columns
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn loaded_mut(&mut self, column: &str) -> Option<&mut CachedValue> {
        self.slots.get_mut(column)?.as_mut()
    }
}

impl fmt::Debug for AttributeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for column in self.loaded_columns() {
            map.entry(&column, &self.get(column));
        }
        map.finish()
    }
}
