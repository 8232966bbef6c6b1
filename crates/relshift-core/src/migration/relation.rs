//! Moves a db field or has_one foreign key, with its data, to another table.

use super::probe::SchemaProbe;
use crate::error::MigrationError;
use crate::report::{StepKind, StepResult};
use crate::sql::{ColumnType, Ident, SqlExecutor, SqlValue};

/// Prefix given to a source column once its data has been moved.
pub const OBSOLETE_PREFIX: &str = "_obsolete_";

/// Validated names of one field move.
struct FieldMovePlan {
    table_current: Ident,
    table_new: Ident,
    field_current: Ident,
    field_new: Ident,
    field_obsolete: Ident,
    field_type: ColumnType,
}

/// Copies a column row by row into another table, then retires the source
/// column under an obsolete name.
///
/// The copy is one UPDATE per source row matched on `ID`, so it works on
/// backends without multi-table UPDATE. There is no wrapping transaction:
/// rows copied before a failure stay copied.
pub struct RelationMigrator<'a, E: ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> RelationMigrator<'a, E> {
    /// Create a migrator over `executor`.
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    /// Move `field_current` of `table_current` into `field_new` of `table_new`.
    pub fn migrate_field(
        &self,
        table_current: &str,
        table_new: &str,
        field_current: &str,
        field_new: &str,
        field_type: &str,
    ) -> StepResult {
        let subjects = vec![
            table_current.to_string(),
            table_new.to_string(),
            field_current.to_string(),
            field_new.to_string(),
        ];
        let failure_message = format!(
            "Unable to migrate {} from {} to {}",
            field_current, table_current, table_new
        );

        let plan = match Self::plan(table_current, table_new, field_current, field_new, field_type)
        {
            Ok(plan) => plan,
            Err(e) => return StepResult::failed(StepKind::MoveField, subjects, failure_message, &e),
        };

        match self.precheck(&plan, &subjects) {
            Ok(Some(skipped)) => return skipped,
            Ok(None) => {}
            Err(e) => return StepResult::failed(StepKind::MoveField, subjects, failure_message, &e),
        }

        let mut copied = 0u64;
        if let Err(e) = self.copy_rows(&plan, &mut copied) {
            tracing::warn!(
                table = %plan.table_current,
                field = %plan.field_current,
                copied,
                error = %e,
                "field copy failed"
            );
            return StepResult::failed(StepKind::MoveField, subjects, failure_message, &e)
                .with_rows(copied);
        }

        let dialect = self.executor.dialect();
        let retire = dialect.rename_column(
            &plan.table_current,
            &plan.field_current,
            &plan.field_obsolete,
            &plan.field_type,
        );
        if let Err(e) = retire.execute(self.executor) {
            let e = MigrationError::from(e);
            tracing::warn!(
                table = %plan.table_current,
                field = %plan.field_current,
                error = %e,
                "retiring source field failed"
            );
            return StepResult::failed(StepKind::MoveField, subjects, failure_message, &e)
                .with_rows(copied);
        }

        tracing::info!(
            from = %plan.table_current,
            to = %plan.table_new,
            field = %plan.field_current,
            copied,
            "field migrated"
        );
        StepResult::success(
            StepKind::MoveField,
            subjects,
            format!(
                "Migration successful. {} relations were migrated to {}. {} renamed to {} in {}",
                copied, plan.table_new, plan.field_current, plan.field_obsolete, plan.table_current
            ),
        )
        .with_rows(copied)
    }

    fn plan(
        table_current: &str,
        table_new: &str,
        field_current: &str,
        field_new: &str,
        field_type: &str,
    ) -> Result<FieldMovePlan, MigrationError> {
        let field_current = Ident::new(field_current)?;
        Ok(FieldMovePlan {
            table_current: Ident::new(table_current)?,
            table_new: Ident::new(table_new)?,
            field_obsolete: field_current.with_prefix(OBSOLETE_PREFIX)?,
            field_current,
            field_new: Ident::new(field_new)?,
            field_type: ColumnType::new(field_type)?,
        })
    }

    /// Returns a skipped result when there is nothing to move, and a conflict
    /// when the obsolete column name is already taken.
    fn precheck(
        &self,
        plan: &FieldMovePlan,
        subjects: &[String],
    ) -> Result<Option<StepResult>, MigrationError> {
        let probe = SchemaProbe::new(self.executor);
        let skip = |message: String, object: String| {
            tracing::debug!(%message, "field move skipped");
            Some(StepResult::skipped_by(
                StepKind::MoveField,
                subjects.to_vec(),
                message,
                &MigrationError::NotFound { object },
            ))
        };

        if !probe.table_exists(&plan.table_new)? {
            return Ok(skip(
                format!("{} does not exist yet", plan.table_new),
                format!("{} table", plan.table_new),
            ));
        }

        if !probe.column_exists(&plan.table_new, &plan.field_new)? {
            return Ok(skip(
                format!("{}.{} does not exist yet", plan.table_new, plan.field_new),
                format!("{}.{}", plan.table_new, plan.field_new),
            ));
        }

        if !probe.table_exists(&plan.table_current)? {
            return Ok(skip(
                format!("{} does not exist", plan.table_current),
                format!("{} table", plan.table_current),
            ));
        }

        if !probe.column_exists(&plan.table_current, &plan.field_current)? {
            let message = if probe.column_exists(&plan.table_current, &plan.field_obsolete)? {
                format!(
                    "{} was already migrated to {} ({} exists)",
                    plan.field_current, plan.table_new, plan.field_obsolete
                )
            } else {
                format!("{} does not exist in {}", plan.field_current, plan.table_current)
            };
            return Ok(skip(
                message,
                format!("{}.{}", plan.table_current, plan.field_current),
            ));
        }

        // The retire step would collide, so nothing may be copied.
        if probe.column_exists(&plan.table_current, &plan.field_obsolete)? {
            return Err(MigrationError::Conflict {
                object: format!("{}.{}", plan.table_current, plan.field_obsolete),
            });
        }

        Ok(None)
    }

    fn copy_rows(&self, plan: &FieldMovePlan, copied: &mut u64) -> Result<(), MigrationError> {
        let dialect = self.executor.dialect();
        let rows = dialect
            .select_field_with_id(&plan.table_current, &plan.field_current)
            .query(self.executor)?;

        for row in rows.iter() {
            // Columns come back in select order: field, then ID.
            let value = row.get_index(0).cloned().unwrap_or(SqlValue::Null);
            let id = row.get_index(1).cloned().unwrap_or(SqlValue::Null);
            dialect
                .update_field_by_id(&plan.table_new, &plan.field_new, value, id)
                .execute(self.executor)?;
            *copied += 1;
        }

        Ok(())
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::sql::{RecordingExecutor, SqliteExecutor};

    #[test]
    fn test_invalid_names_fail_before_any_statement() {
        let db = SqliteExecutor::open_in_memory().unwrap();
        let recorder = RecordingExecutor::new(&db);

        let step = RelationMigrator::new(&recorder).migrate_field(
            "Page",
            "NewsPage",
            "Author ID",
            "AuthorID",
            "INT",
        );

        assert!(step.is_failed());
        assert_eq!(step.error_kind(), Some(ErrorKind::InvalidIdentifier));
        assert!(recorder.statements().is_empty());
    }

    #[test]
    fn test_missing_source_field_is_skipped() {
        let db = SqliteExecutor::open_in_memory().unwrap();
        db.connection()
            .execute_batch(
                "CREATE TABLE Page (ID INTEGER PRIMARY KEY);
                 CREATE TABLE NewsPage (ID INTEGER PRIMARY KEY, AuthorID INT);",
            )
            .unwrap();

        let step =
            RelationMigrator::new(&db).migrate_field("Page", "NewsPage", "AuthorID", "AuthorID", "INT");

        assert!(step.is_skipped());
        assert_eq!(step.error_kind(), Some(ErrorKind::NotFound));
        assert_eq!(step.message(), "AuthorID does not exist in Page");
    }

    #[test]
    fn test_taken_obsolete_name_conflicts_before_copy() {
        let db = SqliteExecutor::open_in_memory().unwrap();
        db.connection()
            .execute_batch(
                "CREATE TABLE Page (ID INTEGER PRIMARY KEY, AuthorID INT, _obsolete_AuthorID INT);
                 CREATE TABLE NewsPage (ID INTEGER PRIMARY KEY, AuthorID INT);
                 INSERT INTO Page (ID, AuthorID) VALUES (1, 5);
                 INSERT INTO NewsPage (ID) VALUES (1);",
            )
            .unwrap();
        let recorder = RecordingExecutor::new(&db);

        let step = RelationMigrator::new(&recorder)
            .migrate_field("Page", "NewsPage", "AuthorID", "AuthorID", "INT");

        assert!(step.is_failed());
        assert_eq!(step.error_kind(), Some(ErrorKind::Conflict));
        assert_eq!(step.rows_affected(), None);
        assert!(recorder.mutations().is_empty());
    }
}
