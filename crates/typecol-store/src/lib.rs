//! Reference record store for typed JSON columns.
//!
//! Rows keep their JSON columns as text, the way a relational `json`
//! column does, and hand them to the attribute binder on first read. Saving
//! a row runs the binder's pre-persist hook before committing.
//!
//! # Snapshot Format
//!
//! When configured with a path, every save rewrites a JSON snapshot:
//!
//! ```text
//! {
//!   "magic": "typecol-store",
//!   "version": 1,
//!   "last_saved_at": "2026-01-01T00:00:00+00:00",
//!   "next_id": 3,
//!   "tables": { "User": { "1": { "settings": "{\"theme\":\"dark\"}" } } }
//! }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use typecol_store::{Store, StoreConfig};
//!
//! let mut store = Store::open(binder, StoreConfig::with_path("store.json"))?;
//! let mut user = store.create("User", |binder, row| {
//!     binder.assign(row, &SETTINGS, serde_json::json!({"theme": "dark"}).into())
//! })?;
//!
//! if let Some(settings) = store.attribute(&mut user, &SETTINGS)? {
//!     settings.font_size = 18;
//! }
//! store.save(&mut user)?;
//! ```

mod config;
mod error;
mod io;
mod row;
mod snapshot;
mod store;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use io::{load_snapshot, save_snapshot};
pub use row::Row;
pub use snapshot::{CURRENT_SNAPSHOT_VERSION, SNAPSHOT_MAGIC, Snapshot, StoredRow, Table};
pub use store::Store;
