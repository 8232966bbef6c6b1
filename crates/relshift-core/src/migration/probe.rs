//! Existence probes against the live catalog.

use crate::sql::{Ident, SqlError, SqlExecutor, SqlValue};

pub(crate) struct SchemaProbe<'a, E: ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> SchemaProbe<'a, E> {
    pub(crate) fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    pub(crate) fn table_exists(&self, table: &Ident) -> Result<bool, SqlError> {
        let stmt = self.executor.dialect().table_exists(table);
        Ok(self.count(&stmt.query(self.executor)?)? > 0)
    }

    pub(crate) fn column_exists(&self, table: &Ident, column: &Ident) -> Result<bool, SqlError> {
        let stmt = self.executor.dialect().column_exists(table, column);
        Ok(self.count(&stmt.query(self.executor)?)? > 0)
    }

    pub(crate) fn row_count(&self, table: &Ident) -> Result<u64, SqlError> {
        let stmt = self.executor.dialect().count_rows(table);
        self.count(&stmt.query(self.executor)?)
    }

    fn count(&self, rows: &crate::sql::Rows) -> Result<u64, SqlError> {
        rows.scalar()
            .and_then(SqlValue::as_i64)
            .map(|n| n.max(0) as u64)
            .ok_or_else(|| SqlError::new("count query returned no integer"))
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::sql::SqliteExecutor;

    #[test]
    fn test_probes() {
        let db = SqliteExecutor::open_in_memory().unwrap();
        db.connection()
            .execute_batch(
                "CREATE TABLE Page (ID INTEGER PRIMARY KEY, AuthorID INT);
                 INSERT INTO Page (AuthorID) VALUES (1), (2);",
            )
            .unwrap();
        let probe = SchemaProbe::new(&db);
        let page = Ident::new("Page").unwrap();

        assert!(probe.table_exists(&page).unwrap());
        assert!(probe.table_exists(&Ident::new("page").unwrap()).unwrap());
        assert!(!probe.table_exists(&Ident::new("Missing").unwrap()).unwrap());
        assert!(probe.column_exists(&page, &Ident::new("AuthorID").unwrap()).unwrap());
        assert!(!probe.column_exists(&page, &Ident::new("Nope").unwrap()).unwrap());
        assert_eq!(probe.row_count(&page).unwrap(), 2);
    }
}
