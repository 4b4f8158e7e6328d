//! Schema error types.
//!
//! Every failure names the offending field paths so callers can report all
//! problems of a document at once instead of fixing them one by one.

use std::fmt;

use thiserror::Error;

/// What is wrong with a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// The field is absent (or null) and declares no default.
    Missing,

    /// The value does not have the declared type.
    TypeMismatch {
        expected: String,
        actual: &'static str,
    },

    /// A document that must be a JSON object is something else.
    NotAnObject { actual: &'static str },

    /// serde rejected the value while converting to or from the struct.
    Serde(String),
}

/// A problem found at one location of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Dotted path to the field (`settings.theme`, `tags[2]`).
    /// Empty for the document itself.
    pub path: String,

    /// What went wrong.
    pub kind: IssueKind,
}

impl FieldIssue {
    pub fn new(path: impl Into<String>, kind: IssueKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Returns true if the issue concerns the whole document.
    pub fn is_document_level(&self) -> bool {
        self.path.is_empty()
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = if self.path.is_empty() {
            "document"
        } else {
            self.path.as_str()
        };
        match &self.kind {
            IssueKind::Missing => write!(f, "{location}: missing required field"),
            IssueKind::TypeMismatch { expected, actual } => {
                write!(f, "{location}: expected {expected}, got {actual}")
            }
            IssueKind::NotAnObject { actual } => {
                write!(f, "{location}: expected an object, got {actual}")
            }
            IssueKind::Serde(message) => write!(f, "{location}: {message}"),
        }
    }
}

/// Schema operation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A structural value does not conform to the schema.
    #[error("Failed to deserialize {schema}: {}", join_issues(.issues))]
    Deserialization {
        schema: String,
        issues: Vec<FieldIssue>,
    },

    /// A typed value could not be encoded into a schema-valid document.
    #[error("Failed to serialize {schema}: {}", join_issues(.issues))]
    Serialization {
        schema: String,
        issues: Vec<FieldIssue>,
    },

    /// The schema itself is malformed.
    #[error("Invalid schema {schema}: {reason}")]
    Definition { schema: String, reason: String },
}

impl SchemaError {
    /// Field-level issues carried by this error (empty for definition errors).
    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            Self::Deserialization { issues, .. } | Self::Serialization { issues, .. } => issues,
            Self::Definition { .. } => &[],
        }
    }

    /// Paths of every field named by this error.
    pub fn offending_fields(&self) -> Vec<&str> {
        self.issues()
            .iter()
            .filter(|issue| !issue.is_document_level())
            .map(|issue| issue.path.as_str())
            .collect()
    }

    /// Name of the schema involved.
    pub fn schema(&self) -> &str {
        match self {
            Self::Deserialization { schema, .. }
            | Self::Serialization { schema, .. }
            | Self::Definition { schema, .. } => schema,
        }
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
