//! On-disk snapshot of every table.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current snapshot format version.
///
/// The loader rejects files with a higher version.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

/// Value of the `magic` field identifying snapshot files.
pub const SNAPSHOT_MAGIC: &str = "typecol-store";

/// Stored columns of one row, as JSON text. A missing column is NULL.
pub type StoredRow = BTreeMap<String, String>;

/// Rows of one record type, keyed by id.
pub type Table = BTreeMap<u64, StoredRow>;

/// Snapshot file contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub magic: String,
    pub version: u32,
    /// RFC 3339 timestamp of the last write.
    pub last_saved_at: String,
    /// Next id handed out to a new row.
    pub next_id: u64,
    pub tables: BTreeMap<String, Table>,
}

impl Snapshot {
    pub fn new(next_id: u64, tables: BTreeMap<String, Table>) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC.to_string(),
            version: CURRENT_SNAPSHOT_VERSION,
            last_saved_at: Utc::now().to_rfc3339(),
            next_id,
            tables,
        }
    }

    /// Update the last saved timestamp.
    pub fn touch(&mut self) {
        self.last_saved_at = Utc::now().to_rfc3339();
    }

    /// Parse the last_saved_at timestamp.
    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.last_saved_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}
