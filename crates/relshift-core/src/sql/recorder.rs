//! Statement-recording executor, also used for dry runs.

use super::{Dialect, Rows, SqlError, SqlExecutor, SqlValue};
use parking_lot::Mutex;

/// Wraps an executor and records every statement sent through it.
///
/// In dry-run mode, [`execute`](SqlExecutor::execute) calls are recorded but
/// not forwarded; reads always reach the inner executor so existence probes
/// still reflect the live schema.
pub struct RecordingExecutor<E> {
    inner: E,
    dry_run: bool,
    statements: Mutex<Vec<String>>,
    mutations: Mutex<Vec<String>>,
}

impl<E: SqlExecutor> RecordingExecutor<E> {
    /// Record and forward everything.
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            dry_run: false,
            statements: Mutex::new(Vec::new()),
            mutations: Mutex::new(Vec::new()),
        }
    }

    /// Record everything, forward only reads.
    pub fn dry_run(inner: E) -> Self {
        Self {
            dry_run: true,
            ..Self::new(inner)
        }
    }

    /// Whether mutating statements are withheld.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Every statement seen, in order.
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().clone()
    }

    /// Only the statements passed to `execute`, in order.
    pub fn mutations(&self) -> Vec<String> {
        self.mutations.lock().clone()
    }

    /// The wrapped executor.
    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: SqlExecutor> SqlExecutor for RecordingExecutor<E> {
    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64, SqlError> {
        self.statements.lock().push(sql.to_string());
        self.mutations.lock().push(sql.to_string());
        if self.dry_run {
            return Ok(0);
        }
        self.inner.execute(sql, params)
    }

    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Rows, SqlError> {
        self.statements.lock().push(sql.to_string());
        self.inner.query(sql, params)
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::sql::SqliteExecutor;

    #[test]
    fn test_dry_run_withholds_mutations() {
        let db = SqliteExecutor::open_in_memory().unwrap();
        db.execute("CREATE TABLE t (ID INTEGER PRIMARY KEY)", &[])
            .unwrap();

        let recorder = RecordingExecutor::dry_run(&db);
        recorder.execute("DROP TABLE t", &[]).unwrap();
        let rows = recorder
            .query("SELECT COUNT(*) FROM sqlite_master WHERE name = 't'", &[])
            .unwrap();

        assert_eq!(rows.scalar().and_then(SqlValue::as_i64), Some(1));
        assert_eq!(recorder.mutations(), vec!["DROP TABLE t".to_string()]);
        assert_eq!(recorder.statements().len(), 2);
    }

    #[test]
    fn test_passthrough_forwards_mutations() {
        let recorder = RecordingExecutor::new(SqliteExecutor::open_in_memory().unwrap());
        recorder
            .execute("CREATE TABLE t (ID INTEGER PRIMARY KEY)", &[])
            .unwrap();
        assert!(recorder.inner().query("SELECT * FROM t", &[]).is_ok());
        assert!(!recorder.is_dry_run());
    }
}
