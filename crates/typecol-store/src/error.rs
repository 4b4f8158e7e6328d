//! Store error types.
//!
//! Store operations return structured errors with a user-facing message and
//! an optional remediation hint, next to the technical `Display` form.

use std::path::PathBuf;

use thiserror::Error;
use typecol_binder::AttributeError;

/// Store operation error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A typed column rejected a read, an assignment, or the pre-save flush.
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    /// No row with this id in the table.
    #[error("{record_type} with id {id} not found")]
    RecordNotFound { record_type: String, id: u64 },

    /// The row has never been saved, so there is nothing to reload.
    #[error("{record_type} row has not been saved")]
    NotPersisted { record_type: String },

    /// File I/O error.
    #[error("Failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Not a snapshot file.
    #[error("Invalid snapshot file format: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    /// Snapshot written by a newer version.
    #[error("Snapshot version {found} is not supported (maximum: {max_supported})")]
    UnsupportedVersion {
        found: u32,
        max_supported: u32,
        path: PathBuf,
    },

    /// Encoding a column or the snapshot failed.
    #[error("Failed to serialize store data")]
    Serialization {
        #[source]
        source: serde_json::Error,
    },

    /// Decoding the snapshot body failed.
    #[error("Failed to deserialize store data")]
    Deserialization {
        #[source]
        source: serde_json::Error,
    },

    /// Temp file could not be renamed over the target.
    #[error("Failed to complete save operation")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Attribute(error) => match error.schema_error() {
                Some(schema_error) if !schema_error.offending_fields().is_empty() => format!(
                    "The value for '{}' is invalid (fields: {}).",
                    error.column().unwrap_or("unknown"),
                    schema_error.offending_fields().join(", ")
                ),
                _ => error.to_string(),
            },
            Self::RecordNotFound { record_type, id } => {
                format!("No {record_type} with id {id} exists.")
            }
            Self::NotPersisted { record_type } => {
                format!("This {record_type} has not been saved yet.")
            }
            Self::Io {
                operation, path, ..
            } => {
                format!("Could not {} the file at {}", operation, path.display())
            }
            Self::InvalidFormat { path, reason } => {
                format!(
                    "The file at {} is not a valid snapshot file: {}",
                    path.display(),
                    reason
                )
            }
            Self::UnsupportedVersion {
                found,
                max_supported,
                ..
            } => {
                format!(
                    "This snapshot was written by a newer version \
                    (file version {found}, this version supports up to {max_supported})."
                )
            }
            Self::Serialization { .. } => "An error occurred while saving the store.".to_string(),
            Self::Deserialization { .. } => {
                "An error occurred while reading the snapshot. The file may be corrupted."
                    .to_string()
            }
            Self::AtomicWriteFailed { target_path, .. } => {
                format!(
                    "Could not save the file to {}. Please check disk space and permissions.",
                    target_path.display()
                )
            }
        }
    }

    /// Get a suggestion for how to resolve this error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Attribute(error) if error.is_contract_violation() => {
                Some("Register the column for this record type before using it.".into())
            }
            Self::Attribute(_) => {
                Some("Fix the listed fields and assign the value again.".into())
            }
            Self::RecordNotFound { .. } => None,
            Self::NotPersisted { .. } => Some("Save the row before reloading it.".into()),
            Self::Io { operation, .. } => {
                if *operation == "read" {
                    Some("Check that the file exists and you have permission to read it.".into())
                } else {
                    Some("Check that you have permission to write to this location.".into())
                }
            }
            Self::InvalidFormat { .. } => Some("Make sure the path points to a snapshot file.".into()),
            Self::UnsupportedVersion { .. } => Some("Upgrade to the latest version.".into()),
            Self::Serialization { .. } => None,
            Self::Deserialization { .. } => Some("Try opening a backup if you have one.".into()),
            Self::AtomicWriteFailed { .. } => {
                Some("Free up disk space or try saving to a different location.".into())
            }
        }
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
