//! Typed column handles and assignment values.

use std::fmt;
use std::marker::PhantomData;

use serde_json::{Map, Value};

/// Handle naming a typed column whose values are `S`.
///
/// Declared once as a constant and used for both registration and access:
///
/// ```ignore
/// pub const SETTINGS: Column<UserSettings> = Column::new("settings");
/// ```
pub struct Column<S> {
    name: &'static str,
    _marker: PhantomData<fn() -> S>,
}

impl<S> Column<S> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<S> Clone for Column<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Column<S> {}

impl<S> fmt::Debug for Column<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("struct", &std::any::type_name::<S>())
            .finish()
    }
}

/// Value assigned to a typed column.
///
/// `Structural` accepts any JSON value so callers can forward untrusted
/// input unchanged; only objects and null are valid, every other shape is
/// rejected at assignment time.
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment<S> {
    /// An already-typed struct.
    Typed(S),
    /// A structural value, validated and normalized through the schema.
    Structural(Value),
    /// Clear the column.
    Nil,
}

impl<S> Assignment<S> {
    pub fn from_option(value: Option<S>) -> Self {
        value.map_or(Self::Nil, Self::Typed)
    }
}

impl<S> From<Value> for Assignment<S> {
    fn from(value: Value) -> Self {
        Self::Structural(value)
    }
}

impl<S> From<Map<String, Value>> for Assignment<S> {
    fn from(map: Map<String, Value>) -> Self {
        Self::Structural(Value::Object(map))
    }
}
