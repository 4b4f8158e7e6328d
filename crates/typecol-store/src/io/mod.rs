//! Snapshot file I/O.
//!
//! - Saving with atomic writes
//! - Loading with format validation

mod load;
mod save;

pub use load::load_snapshot;
pub use save::save_snapshot;
