//! Statement builder for the supported SQL dialects.

use super::{ColumnType, Ident, Rows, SqlError, SqlExecutor, SqlValue};
use serde::{Deserialize, Serialize};

/// Primary key column every migrated table carries.
pub const ID_COLUMN: &str = "ID";

/// SQL dialect of the target database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// SQLite 3.25+ (needs `RENAME COLUMN` and `pragma_table_info`).
    Sqlite,
    /// MySQL / MariaDB.
    MySql,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Sqlite => write!(f, "sqlite"),
            Dialect::MySql => write!(f, "mysql"),
        }
    }
}

/// SQL text plus its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Statement text. Only validated identifiers are interpolated.
    pub sql: String,
    /// Bound values.
    pub params: Vec<SqlValue>,
}

impl Statement {
    fn new(sql: String) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }

    fn bind(mut self, value: impl Into<SqlValue>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Run as DDL/DML.
    pub fn execute<E: SqlExecutor + ?Sized>(&self, executor: &E) -> Result<u64, SqlError> {
        tracing::debug!(sql = %self.sql, params = self.params.len(), "execute");
        executor.execute(&self.sql, &self.params)
    }

    /// Run as a read.
    pub fn query<E: SqlExecutor + ?Sized>(&self, executor: &E) -> Result<Rows, SqlError> {
        tracing::debug!(sql = %self.sql, params = self.params.len(), "query");
        executor.query(&self.sql, &self.params)
    }
}

impl Dialect {
    /// Quote a validated identifier.
    pub fn quote(&self, ident: &Ident) -> String {
        match self {
            Dialect::Sqlite => format!("\"{}\"", ident),
            Dialect::MySql => format!("`{}`", ident),
        }
    }

    /// Whether two table names that differ only in case name the same table.
    ///
    /// SQLite folds table names and refuses a case-only `RENAME TO`; MySQL
    /// on a case-sensitive filesystem keeps them apart.
    pub fn folds_table_case(&self) -> bool {
        matches!(self, Dialect::Sqlite)
    }

    fn placeholder(&self, n: usize) -> String {
        match self {
            Dialect::Sqlite => format!("?{}", n),
            Dialect::MySql => "?".to_string(),
        }
    }

    fn id_column(&self) -> String {
        match self {
            Dialect::Sqlite => format!("\"{}\"", ID_COLUMN),
            Dialect::MySql => format!("`{}`", ID_COLUMN),
        }
    }

    /// Count of tables named `table` (0 or 1).
    pub fn table_exists(&self, table: &Ident) -> Statement {
        let sql = match self {
            Dialect::Sqlite => {
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE"
                    .to_string()
            }
            Dialect::MySql => "SELECT COUNT(*) FROM information_schema.tables \
                 WHERE table_schema = DATABASE() AND table_name = ?"
                .to_string(),
        };
        Statement::new(sql).bind(table.as_str())
    }

    /// Count of columns named `column` on `table` (0 or 1).
    pub fn column_exists(&self, table: &Ident, column: &Ident) -> Statement {
        let sql = match self {
            Dialect::Sqlite => {
                "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2 COLLATE NOCASE"
                    .to_string()
            }
            Dialect::MySql => "SELECT COUNT(*) FROM information_schema.columns \
                 WHERE table_schema = DATABASE() AND table_name = ? AND column_name = ?"
                .to_string(),
        };
        Statement::new(sql)
            .bind(table.as_str())
            .bind(column.as_str())
    }

    /// Number of rows in `table`.
    pub fn count_rows(&self, table: &Ident) -> Statement {
        Statement::new(format!("SELECT COUNT(*) FROM {}", self.quote(table)))
    }

    /// Drop `table`.
    pub fn drop_table(&self, table: &Ident) -> Statement {
        Statement::new(format!("DROP TABLE IF EXISTS {}", self.quote(table)))
    }

    /// Rename `from` to `to`.
    pub fn rename_table(&self, from: &Ident, to: &Ident) -> Statement {
        let sql = match self {
            Dialect::Sqlite => format!(
                "ALTER TABLE {} RENAME TO {}",
                self.quote(from),
                self.quote(to)
            ),
            Dialect::MySql => format!("RENAME TABLE {} TO {}", self.quote(from), self.quote(to)),
        };
        Statement::new(sql)
    }

    /// Rename column `from` to `to` on `table`, giving it `column_type`.
    ///
    /// SQLite cannot change a column type in place, so there the column keeps
    /// its declared type and only the name changes.
    pub fn rename_column(
        &self,
        table: &Ident,
        from: &Ident,
        to: &Ident,
        column_type: &ColumnType,
    ) -> Statement {
        let sql = match self {
            Dialect::Sqlite => format!(
                "ALTER TABLE {} RENAME COLUMN {} TO {}",
                self.quote(table),
                self.quote(from),
                self.quote(to)
            ),
            Dialect::MySql => format!(
                "ALTER TABLE {} CHANGE COLUMN {} {} {}",
                self.quote(table),
                self.quote(from),
                self.quote(to),
                column_type
            ),
        };
        Statement::new(sql)
    }

    /// Read `field` and the ID of every row in `table`.
    pub fn select_field_with_id(&self, table: &Ident, field: &Ident) -> Statement {
        Statement::new(format!(
            "SELECT {}, {} FROM {}",
            self.quote(field),
            self.id_column(),
            self.quote(table)
        ))
    }

    /// Set `field` to `value` on the row of `table` with the given ID.
    pub fn update_field_by_id(
        &self,
        table: &Ident,
        field: &Ident,
        value: SqlValue,
        id: SqlValue,
    ) -> Statement {
        Statement::new(format!(
            "UPDATE {} SET {} = {} WHERE {} = {}",
            self.quote(table),
            self.quote(field),
            self.placeholder(1),
            self.id_column(),
            self.placeholder(2)
        ))
        .bind(value)
        .bind(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Ident {
        Ident::new(name).unwrap()
    }

    #[test]
    fn test_sqlite_statements() {
        let d = Dialect::Sqlite;
        assert_eq!(
            d.rename_table(&ident("Page_Categories"), &ident("NewsPage_Categories"))
                .sql,
            "ALTER TABLE \"Page_Categories\" RENAME TO \"NewsPage_Categories\""
        );
        assert_eq!(
            d.rename_column(
                &ident("NewsPage_Categories"),
                &ident("PageID"),
                &ident("NewsPageID"),
                &ColumnType::default()
            )
            .sql,
            "ALTER TABLE \"NewsPage_Categories\" RENAME COLUMN \"PageID\" TO \"NewsPageID\""
        );
        assert_eq!(
            d.drop_table(&ident("OldTable")).sql,
            "DROP TABLE IF EXISTS \"OldTable\""
        );
    }

    #[test]
    fn test_mysql_statements() {
        let d = Dialect::MySql;
        assert_eq!(
            d.rename_table(&ident("Page_Categories"), &ident("NewsPage_Categories"))
                .sql,
            "RENAME TABLE `Page_Categories` TO `NewsPage_Categories`"
        );
        assert_eq!(
            d.rename_column(
                &ident("Page"),
                &ident("AuthorID"),
                &ident("_obsolete_AuthorID"),
                &ColumnType::default()
            )
            .sql,
            "ALTER TABLE `Page` CHANGE COLUMN `AuthorID` `_obsolete_AuthorID` INT"
        );
    }

    #[test]
    fn test_values_are_bound_not_interpolated() {
        let stmt = Dialect::Sqlite.update_field_by_id(
            &ident("NewsPage"),
            &ident("Summary"),
            SqlValue::from("it's ' quoted"),
            SqlValue::Integer(4),
        );
        assert_eq!(
            stmt.sql,
            "UPDATE \"NewsPage\" SET \"Summary\" = ?1 WHERE \"ID\" = ?2"
        );
        assert_eq!(
            stmt.params,
            vec![SqlValue::from("it's ' quoted"), SqlValue::Integer(4)]
        );

        let probe = Dialect::MySql.column_exists(&ident("Page"), &ident("AuthorID"));
        assert!(!probe.sql.contains("AuthorID"));
        assert_eq!(probe.params.len(), 2);
    }
}
