//! Attribute binder error types.

use thiserror::Error;
use typecol_schema::SchemaError;

/// Error raised by a typed column operation.
#[derive(Debug, Error)]
pub enum AttributeError {
    /// The stored or assigned structural value does not fit the schema.
    #[error("Invalid value for {column}: {source}")]
    Deserialization {
        column: String,
        #[source]
        source: SchemaError,
    },

    /// A typed value could not be encoded for storage.
    #[error("Cannot store {column}: {source}")]
    Serialization {
        column: String,
        #[source]
        source: SchemaError,
    },

    /// The assigned value is neither the column's struct, a map, nor nil.
    #[error("{column} must be a {expected}, a structural map, or nil, got {actual}")]
    InvalidAssignmentShape {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// The column was never registered on the record type or its ancestors.
    #[error("Column {column} is not registered on {record_type}")]
    UnregisteredColumn { record_type: String, column: String },

    /// A column handle names a struct other than the one it was registered with.
    #[error("Column {column} on {record_type} holds {bound}, not {requested}")]
    ColumnTypeMismatch {
        record_type: String,
        column: String,
        bound: &'static str,
        requested: &'static str,
    },

    #[error("Record type {0} is not declared")]
    UnknownRecordType(String),

    #[error("Record type {0} is already declared")]
    DuplicateRecordType(String),

    /// The struct's schema failed to build at registration time.
    #[error("Invalid schema for column {column}: {source}")]
    Schema {
        column: String,
        #[source]
        source: SchemaError,
    },
}

impl AttributeError {
    /// Column the error refers to, if any.
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::Deserialization { column, .. }
            | Self::Serialization { column, .. }
            | Self::InvalidAssignmentShape { column, .. }
            | Self::UnregisteredColumn { column, .. }
            | Self::ColumnTypeMismatch { column, .. }
            | Self::Schema { column, .. } => Some(column),
            Self::UnknownRecordType(_) | Self::DuplicateRecordType(_) => None,
        }
    }

    /// Returns true for errors caused by wrong declarations rather than bad data.
    ///
    /// These indicate a bug in the calling code; retrying with different
    /// input will not help.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::UnregisteredColumn { .. }
                | Self::ColumnTypeMismatch { .. }
                | Self::UnknownRecordType(_)
                | Self::DuplicateRecordType(_)
                | Self::Schema { .. }
        )
    }

    /// Underlying schema error, for deserialization and serialization failures.
    pub fn schema_error(&self) -> Option<&SchemaError> {
        match self {
            Self::Deserialization { source, .. }
            | Self::Serialization { source, .. }
            | Self::Schema { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for binder operations.
pub type Result<T> = std::result::Result<T, AttributeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_shape_message() {
        let error = AttributeError::InvalidAssignmentShape {
            column: "settings".to_string(),
            expected: "UserSettings",
            actual: "string",
        };
        assert_eq!(
            error.to_string(),
            "settings must be a UserSettings, a structural map, or nil, got string"
        );
        assert_eq!(error.column(), Some("settings"));
        assert!(!error.is_contract_violation());
    }

    #[test]
    fn test_contract_violations() {
        let error = AttributeError::UnregisteredColumn {
            record_type: "User".to_string(),
            column: "profile".to_string(),
        };
        assert!(error.is_contract_violation());
        assert!(AttributeError::UnknownRecordType("Ghost".to_string()).is_contract_violation());
    }
}
