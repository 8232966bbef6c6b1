//! Table and column renames used by the many_many migration.

use super::probe::SchemaProbe;
use crate::error::MigrationError;
use crate::report::{StepKind, StepResult};
use crate::sql::{ColumnType, Ident, SqlExecutor};

/// Renames a table, tolerating a rename that already happened.
pub struct TableRenamer<'a, E: ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> TableRenamer<'a, E> {
    /// Create a renamer over `executor`.
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    /// Rename `old_name` to `new_name`.
    ///
    /// A case-only rename is skipped on dialects that fold table names.
    pub fn rename(&self, old_name: &str, new_name: &str) -> StepResult {
        let subjects = vec![old_name.to_string(), new_name.to_string()];
        self.try_rename(old_name, new_name, &subjects)
            .unwrap_or_else(|e| {
                tracing::warn!(from = old_name, to = new_name, error = %e, "table rename failed");
                StepResult::failed(
                    StepKind::RenameTable,
                    subjects.clone(),
                    format!("Unable to rename {} table to {}", old_name, new_name),
                    &e,
                )
            })
    }

    fn try_rename(
        &self,
        old_name: &str,
        new_name: &str,
        subjects: &[String],
    ) -> Result<StepResult, MigrationError> {
        let from = Ident::new(old_name)?;
        let to = Ident::new(new_name)?;
        let probe = SchemaProbe::new(self.executor);
        let dialect = self.executor.dialect();
        let case_only = from.as_str().eq_ignore_ascii_case(to.as_str());

        if from == to || (case_only && dialect.folds_table_case()) {
            return Ok(StepResult::skipped(
                StepKind::RenameTable,
                subjects.to_vec(),
                format!("{} table already has the requested name", from),
            ));
        }

        if !probe.table_exists(&from)? {
            let missing = MigrationError::NotFound {
                object: format!("{} table", from),
            };
            return Ok(StepResult::skipped_by(
                StepKind::RenameTable,
                subjects.to_vec(),
                format!("{} table doesn't exist. It might have been renamed already", from),
                &missing,
            ));
        }

        // The catalog probe ignores case, so a case-only rename sees itself.
        if !case_only && probe.table_exists(&to)? {
            return Err(MigrationError::Conflict {
                object: format!("{} table", to),
            });
        }

        dialect.rename_table(&from, &to).execute(self.executor)?;
        tracing::info!(from = %from, to = %to, "table renamed");

        Ok(StepResult::success(
            StepKind::RenameTable,
            subjects.to_vec(),
            format!("{} table renamed to {}", from, to),
        ))
    }
}

/// Renames (and, where the dialect allows, retypes) a column.
pub struct FieldRenamer<'a, E: ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> FieldRenamer<'a, E> {
    /// Create a renamer over `executor`.
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    /// Rename `old_field` to `new_field` on `table_name` as an `INT` column.
    pub fn rename_field(&self, table_name: &str, old_field: &str, new_field: &str) -> StepResult {
        self.rename_field_as(table_name, old_field, new_field, ColumnType::DEFAULT)
    }

    /// Rename `old_field` to `new_field` on `table_name`, typed `column_type`.
    ///
    /// Skipped when only `new_field` exists. Fails, without issuing an ALTER,
    /// when neither or both columns exist. A change of letter case alone is
    /// a real rename.
    pub fn rename_field_as(
        &self,
        table_name: &str,
        old_field: &str,
        new_field: &str,
        column_type: &str,
    ) -> StepResult {
        let subjects = vec![
            table_name.to_string(),
            old_field.to_string(),
            new_field.to_string(),
        ];
        self.try_rename(table_name, old_field, new_field, column_type, &subjects)
            .unwrap_or_else(|e| {
                tracing::warn!(
                    table = table_name,
                    from = old_field,
                    to = new_field,
                    error = %e,
                    "field rename failed"
                );
                StepResult::failed(
                    StepKind::RenameField,
                    subjects.clone(),
                    "Failed. Field may not exist. Has this migration already been run?",
                    &e,
                )
            })
    }

    fn try_rename(
        &self,
        table_name: &str,
        old_field: &str,
        new_field: &str,
        column_type: &str,
        subjects: &[String],
    ) -> Result<StepResult, MigrationError> {
        let table = Ident::new(table_name)?;
        let from = Ident::new(old_field)?;
        let to = Ident::new(new_field)?;
        let column_type = ColumnType::new(column_type)?;
        let probe = SchemaProbe::new(self.executor);

        if !probe.table_exists(&table)? {
            return Err(MigrationError::NotFound {
                object: format!("{} table", table),
            });
        }

        if from == to {
            return Ok(StepResult::skipped(
                StepKind::RenameField,
                subjects.to_vec(),
                format!("{} already has the requested name", from),
            ));
        }

        let case_only = from.as_str().eq_ignore_ascii_case(to.as_str());
        let has_old = probe.column_exists(&table, &from)?;
        let has_new = !case_only && probe.column_exists(&table, &to)?;
        match (has_old, has_new) {
            (false, true) => {
                return Ok(StepResult::skipped(
                    StepKind::RenameField,
                    subjects.to_vec(),
                    format!("{} is already {} in {}", from, to, table),
                ));
            }
            (false, false) => {
                return Err(MigrationError::NotFound {
                    object: format!("{}.{}", table, from),
                });
            }
            (true, true) => {
                return Err(MigrationError::Conflict {
                    object: format!("{}.{}", table, to),
                });
            }
            (true, false) => {}
        }

        let dialect = self.executor.dialect();
        dialect
            .rename_column(&table, &from, &to, &column_type)
            .execute(self.executor)?;
        tracing::info!(table = %table, from = %from, to = %to, "field renamed");

        Ok(StepResult::success(
            StepKind::RenameField,
            subjects.to_vec(),
            format!("{} is now {}", from, to),
        ))
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::report::StepStatus;
    use crate::sql::{Dialect, RecordingExecutor, Rows, SqlError, SqlValue, SqliteExecutor};

    fn setup() -> SqliteExecutor {
        let db = SqliteExecutor::open_in_memory().unwrap();
        db.connection()
            .execute_batch("CREATE TABLE Tags (ID INTEGER PRIMARY KEY, PageID INT, NewsPageID INT);")
            .unwrap();
        db
    }

    /// Answers every catalog probe with a match, as a MySQL schema holding
    /// all the named objects would.
    struct MySqlCatalog;

    impl SqlExecutor for MySqlCatalog {
        fn dialect(&self) -> Dialect {
            Dialect::MySql
        }

        fn execute(&self, _sql: &str, _params: &[SqlValue]) -> Result<u64, SqlError> {
            Ok(0)
        }

        fn query(&self, _sql: &str, _params: &[SqlValue]) -> Result<Rows, SqlError> {
            Ok(Rows::new(
                vec!["COUNT(*)".to_string()],
                vec![vec![SqlValue::Integer(1)]],
            ))
        }
    }

    #[test]
    fn test_same_name_is_skipped() {
        let db = setup();
        let recorder = RecordingExecutor::new(&db);
        assert!(TableRenamer::new(&recorder).rename("Tags", "Tags").is_skipped());
        assert!(FieldRenamer::new(&recorder)
            .rename_field("Tags", "PageID", "PageID")
            .is_skipped());
        assert!(recorder.mutations().is_empty());
    }

    #[test]
    fn test_case_only_table_rename_on_sqlite_is_skipped() {
        let db = setup();
        let recorder = RecordingExecutor::new(&db);
        assert!(TableRenamer::new(&recorder).rename("Tags", "tags").is_skipped());
        assert!(recorder.mutations().is_empty());
    }

    #[test]
    fn test_case_only_table_rename_on_mysql() {
        let recorder = RecordingExecutor::dry_run(MySqlCatalog);
        let step = TableRenamer::new(&recorder).rename("Tags", "tags");
        assert_eq!(step.status(), StepStatus::Success);
        assert_eq!(recorder.mutations(), vec!["RENAME TABLE `Tags` TO `tags`"]);
    }

    #[test]
    fn test_case_only_field_rename() {
        let db = setup();
        let step = FieldRenamer::new(&db).rename_field("Tags", "PageID", "pageid");
        assert_eq!(step.status(), StepStatus::Success);
        let names: Vec<String> = db
            .connection()
            .prepare("SELECT name FROM pragma_table_info('Tags')")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert!(names.contains(&"pageid".to_string()));
        assert!(!names.contains(&"PageID".to_string()));

        let recorder = RecordingExecutor::dry_run(MySqlCatalog);
        let step = FieldRenamer::new(&recorder).rename_field("Tags", "NewsPageID", "newspageid");
        assert_eq!(step.status(), StepStatus::Success);
        assert_eq!(
            recorder.mutations(),
            vec!["ALTER TABLE `Tags` CHANGE COLUMN `NewsPageID` `newspageid` INT"]
        );
    }

    #[test]
    fn test_both_columns_present_conflict() {
        let db = setup();
        let step = FieldRenamer::new(&db).rename_field("Tags", "PageID", "NewsPageID");
        assert_eq!(step.status(), StepStatus::Failed);
        assert_eq!(step.error_kind(), Some(crate::error::ErrorKind::Conflict));
    }

    #[test]
    fn test_missing_table_fails() {
        let db = setup();
        let step = FieldRenamer::new(&db).rename_field("Nope", "PageID", "NewsPageID");
        assert_eq!(step.status(), StepStatus::Failed);
        assert_eq!(step.cause(), Some("Nope table does not exist"));
    }

    #[test]
    fn test_rename_field_as_validates_type() {
        let db = setup();
        let step = FieldRenamer::new(&db).rename_field_as("Tags", "PageID", "OwnerID", "INT;");
        assert_eq!(step.error_kind(), Some(crate::error::ErrorKind::InvalidIdentifier));
    }
}
