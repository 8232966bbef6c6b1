//! SQL execution boundary.
//!
//! The engine talks to the database only through [`SqlExecutor`]. Values are
//! always bound as parameters; table and column names are validated
//! [`Ident`]s interpolated by a [`Dialect`].

pub mod dialect;
pub mod ident;
pub mod recorder;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use dialect::{Dialect, Statement, ID_COLUMN};
pub use ident::{ColumnType, Ident};
pub use recorder::RecordingExecutor;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteExecutor;

use serde::Serialize;
use thiserror::Error;

/// Error returned by the backend, with its message kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SqlError {
    message: String,
}

impl SqlError {
    /// Create an error from a backend message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The backend message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A single SQL value, either bound as a parameter or read from a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// 64-bit integer.
    Integer(i64),
    /// Floating point.
    Real(f64),
    /// Text.
    Text(String),
    /// Raw bytes.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Integer view of the value, if it has one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(v) => Some(*v),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for SqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Integer(v) => write!(f, "{}", v),
            SqlValue::Real(v) => write!(f, "{}", v),
            SqlValue::Text(s) => write!(f, "{}", s),
            SqlValue::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

/// Result set of a read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
}

impl Rows {
    /// Create a result set from column names and row values.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows returned.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows were returned.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over the rows.
    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |values| Row {
            columns: &self.columns,
            values,
        })
    }

    /// First column of the first row, if any.
    pub fn scalar(&self) -> Option<&SqlValue> {
        self.rows.first().and_then(|row| row.first())
    }
}

/// A borrowed row of a [`Rows`] set.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [SqlValue],
}

impl<'a> Row<'a> {
    /// Value of the named column. Names compare case-insensitively, as SQL
    /// identifiers do.
    pub fn get(&self, column: &str) -> Option<&'a SqlValue> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .and_then(|idx| self.values.get(idx))
    }

    /// Value at a column index.
    pub fn get_index(&self, idx: usize) -> Option<&'a SqlValue> {
        self.values.get(idx)
    }
}

/// A connection capable of running statements and reads.
///
/// Backend failures come back as [`SqlError`] values; implementations must
/// not panic on bad SQL.
pub trait SqlExecutor {
    /// Dialect used to build statements for this backend.
    fn dialect(&self) -> Dialect;

    /// Run a DDL or DML statement, returning the number of affected rows.
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64, SqlError>;

    /// Run a read and collect its rows.
    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Rows, SqlError>;
}

impl<E: SqlExecutor + ?Sized> SqlExecutor for &E {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64, SqlError> {
        (**self).execute(sql, params)
    }

    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Rows, SqlError> {
        (**self).query(sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup_is_case_insensitive() {
        let rows = Rows::new(
            vec!["AuthorID".to_string(), "ID".to_string()],
            vec![vec![SqlValue::Integer(7), SqlValue::Integer(1)]],
        );
        let row = rows.iter().next().unwrap();
        assert_eq!(row.get("authorid"), Some(&SqlValue::Integer(7)));
        assert_eq!(row.get("id"), Some(&SqlValue::Integer(1)));
        assert_eq!(row.get("missing"), None);
        assert_eq!(rows.row_count(), 1);
    }

    #[test]
    fn test_scalar_and_as_i64() {
        let rows = Rows::new(vec!["n".to_string()], vec![vec![SqlValue::Integer(3)]]);
        assert_eq!(rows.scalar().and_then(SqlValue::as_i64), Some(3));
        assert_eq!(SqlValue::from("42").as_i64(), Some(42));
        assert_eq!(SqlValue::Null.as_i64(), None);
        assert!(Rows::default().scalar().is_none());
    }
}
