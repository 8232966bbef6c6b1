//! Drops obsolete tables, but only when they are empty.

use super::probe::SchemaProbe;
use crate::error::MigrationError;
use crate::report::{StepKind, StepResult};
use crate::sql::{Ident, SqlExecutor};

/// Drops a table if it exists and holds no rows.
pub struct TableDropper<'a, E: ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> TableDropper<'a, E> {
    /// Create a dropper over `executor`.
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    /// Drop `table_name` if it is empty.
    ///
    /// A missing table is skipped as already deleted. A table with rows is
    /// skipped with a data-guard cause and never dropped.
    pub fn drop_if_empty(&self, table_name: &str) -> StepResult {
        let subjects = vec![table_name.to_string()];
        self.try_drop(table_name, &subjects).unwrap_or_else(|e| {
            tracing::warn!(table = table_name, error = %e, "table drop failed");
            StepResult::failed(
                StepKind::DropTable,
                subjects.clone(),
                format!("Unable to delete {} table", table_name),
                &e,
            )
        })
    }

    fn try_drop(&self, table_name: &str, subjects: &[String]) -> Result<StepResult, MigrationError> {
        let table = Ident::new(table_name)?;
        let probe = SchemaProbe::new(self.executor);

        if !probe.table_exists(&table)? {
            tracing::debug!(table = %table, "table already deleted");
            let missing = MigrationError::NotFound {
                object: format!("{} table", table),
            };
            return Ok(StepResult::skipped_by(
                StepKind::DropTable,
                subjects.to_vec(),
                format!("{} table already deleted", table),
                &missing,
            ));
        }

        let rows = probe.row_count(&table)?;
        if rows > 0 {
            let guard = MigrationError::DataGuard {
                table: table.to_string(),
                rows,
            };
            tracing::warn!(table = %table, rows, "table has data, not dropping");
            return Ok(StepResult::skipped_by(
                StepKind::DropTable,
                subjects.to_vec(),
                format!("{} table has data - not safe to delete", table),
                &guard,
            ));
        }

        let dialect = self.executor.dialect();
        dialect.drop_table(&table).execute(self.executor)?;
        tracing::info!(table = %table, "table deleted");

        Ok(StepResult::success(
            StepKind::DropTable,
            subjects.to_vec(),
            format!("{} table deleted", table),
        ))
    }
}
