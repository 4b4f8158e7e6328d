//! Store configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for a [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Snapshot file. When set, every save rewrites it and
    /// [`Store::open`](crate::Store::open) loads it if it exists.
    pub path: Option<PathBuf>,

    /// Pretty-print the snapshot JSON.
    pub pretty: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            pretty: true,
        }
    }
}

impl StoreConfig {
    /// Keep everything in memory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Back the store with a snapshot file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.path.is_some()
    }
}
