//! Snapshot loading.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::snapshot::{CURRENT_SNAPSHOT_VERSION, SNAPSHOT_MAGIC, Snapshot};

/// Load a snapshot file.
pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let bytes = fs::read(path).map_err(|e| StoreError::Io {
        operation: "read",
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_snapshot_bytes(&bytes, path)
}

/// Validate the header fields, then decode the body.
fn parse_snapshot_bytes(bytes: &[u8], path: &Path) -> Result<Snapshot> {
    let invalid = |reason: &str| StoreError::InvalidFormat {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let document: Value = serde_json::from_slice(bytes).map_err(|_| invalid("Not a JSON document"))?;

    if document.get("magic").and_then(Value::as_str) != Some(SNAPSHOT_MAGIC) {
        return Err(invalid("Not a typecol snapshot (missing or wrong magic)"));
    }

    let version = document
        .get("version")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| invalid("Missing snapshot version"))?;

    if version > CURRENT_SNAPSHOT_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: version,
            max_supported: CURRENT_SNAPSHOT_VERSION,
            path: path.to_path_buf(),
        });
    }

    let snapshot: Snapshot =
        serde_json::from_value(document).map_err(|source| StoreError::Deserialization { source })?;

    tracing::info!(
        last_saved_at = ?snapshot.last_saved_at(),
        "Loaded snapshot from {}",
        path.display()
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::save::save_snapshot;
    use crate::snapshot::{StoredRow, Table};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn test_load_snapshot_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let row = StoredRow::from([("settings".to_string(), r#"{"theme":"dark"}"#.to_string())]);
        let tables = BTreeMap::from([("User".to_string(), Table::from([(1, row)]))]);
        let mut snapshot = Snapshot::new(2, tables);
        save_snapshot(&mut snapshot, &path, true).unwrap();

        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded, snapshot);
        assert!(loaded.last_saved_at().is_some());
    }

    #[test]
    fn test_load_invalid_magic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("other.json");
        fs::write(&path, br#"{"magic": "something-else", "version": 1}"#).unwrap();

        let result = load_snapshot(&path);
        assert!(matches!(result, Err(StoreError::InvalidFormat { .. })));
    }

    #[test]
    fn test_load_not_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.json");
        fs::write(&path, b"NOT_A_SNAPSHOT").unwrap();

        let result = load_snapshot(&path);
        assert!(matches!(result, Err(StoreError::InvalidFormat { .. })));
    }

    #[test]
    fn test_load_unsupported_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("future.json");
        fs::write(
            &path,
            br#"{"magic": "typecol-store", "version": 999, "last_saved_at": "", "next_id": 1, "tables": {}}"#,
        )
        .unwrap();

        let result = load_snapshot(&path);
        assert!(matches!(
            result,
            Err(StoreError::UnsupportedVersion { found: 999, .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = load_snapshot(&dir.path().join("missing.json"));
        assert!(matches!(
            result,
            Err(StoreError::Io {
                operation: "read",
                ..
            })
        ));
    }

    #[test]
    fn test_load_malformed_body() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(
            &path,
            br#"{"magic": "typecol-store", "version": 1, "next_id": "x"}"#,
        )
        .unwrap();

        let result = load_snapshot(&path);
        assert!(matches!(result, Err(StoreError::Deserialization { .. })));
    }
}
