//! Typed JSON columns for persisted records.
//!
//! A record keeps some columns as JSON documents. This crate lets callers
//! work with those columns as Rust structs instead of raw maps:
//!
//! - **Reads** deserialize the stored document once and cache the struct on
//!   the record; later reads return the same struct.
//! - **Assignments** accept a struct, a structural map, or nil. Both structs
//!   and maps go through the schema before anything is written.
//! - **Before persisting**, cached structs are re-serialized so in-place
//!   changes reach storage.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use typecol_binder::{AttributeBinder, Assignment, BindingRegistry, Column};
//!
//! const SETTINGS: Column<UserSettings> = Column::new("settings");
//!
//! let mut registry = BindingRegistry::new();
//! registry.register("User", &SETTINGS)?;
//! let binder = AttributeBinder::new(Arc::new(registry));
//!
//! binder.assign(&mut user, &SETTINGS, serde_json::json!({"theme": "dark"}).into())?;
//! if let Some(settings) = binder.read(&mut user, &SETTINGS)? {
//!     settings.font_size = 18;
//! }
//! binder.before_persist(&mut user)?;
//! ```
//!
//! # Architecture
//!
//! - `registry.rs` - Column bindings per record type, with inheritance
//! - `cache.rs` - Per-record cache slots
//! - `binder.rs` - Read, assign, and pre-persist logic
//! - `record.rs` - The persistence engine boundary
//! - `column.rs` - Typed column handles and assignment values

mod binder;
mod cache;
mod column;
mod error;
mod record;
mod registry;

pub use binder::AttributeBinder;
pub use cache::{AttributeCache, CachedValue, SlotState};
pub use column::{Assignment, Column};
pub use error::{AttributeError, Result};
pub use record::{RawValue, Record};
pub use registry::{BindingRegistry, ColumnBinding};
