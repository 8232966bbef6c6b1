//! Migration error types.

use crate::sql::SqlError;
use serde::Serialize;
use thiserror::Error;

/// Classification of a migration failure, carried into the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A table or column is missing.
    NotFound,
    /// The destination already exists.
    Conflict,
    /// The backend rejected a statement.
    Execution,
    /// A non-empty table blocked a drop.
    DataGuard,
    /// A configured name is not a safe identifier or column type.
    InvalidIdentifier,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::Conflict => write!(f, "conflict"),
            ErrorKind::Execution => write!(f, "execution"),
            ErrorKind::DataGuard => write!(f, "data_guard"),
            ErrorKind::InvalidIdentifier => write!(f, "invalid_identifier"),
        }
    }
}

/// Errors raised while applying a single directive.
///
/// Operations never let these escape: each one is folded into a
/// [`StepResult`](crate::report::StepResult) before the orchestrator sees it.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A table or column does not exist.
    #[error("{object} does not exist")]
    NotFound {
        /// Description of the missing object.
        object: String,
    },

    /// The destination of a rename already exists.
    #[error("{object} already exists")]
    Conflict {
        /// Description of the existing object.
        object: String,
    },

    /// A table still holds rows and was not dropped.
    #[error("{table} has data ({rows} row(s)) - not safe to delete")]
    DataGuard {
        /// The guarded table.
        table: String,
        /// Rows found in the table.
        rows: u64,
    },

    /// A configured identifier or column type failed validation.
    #[error("invalid identifier {value:?}: {reason}")]
    InvalidIdentifier {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The backend rejected a statement.
    #[error("{0}")]
    Sql(#[from] SqlError),
}

impl MigrationError {
    /// Classify this error for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MigrationError::NotFound { .. } => ErrorKind::NotFound,
            MigrationError::Conflict { .. } => ErrorKind::Conflict,
            MigrationError::DataGuard { .. } => ErrorKind::DataGuard,
            MigrationError::InvalidIdentifier { .. } => ErrorKind::InvalidIdentifier,
            MigrationError::Sql(_) => ErrorKind::Execution,
        }
    }
}
