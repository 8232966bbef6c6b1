//! Re-points a many_many join table from one owner to another.

use super::dropper::TableDropper;
use super::probe::SchemaProbe;
use super::renamer::{FieldRenamer, TableRenamer};
use crate::error::MigrationError;
use crate::report::{StepKind, StepResult};
use crate::sql::{Ident, SqlExecutor};

/// Moves `<Owner>_<Relation>` to `<NewOwner>_<Relation>` and renames its
/// `<Owner>ID` column to `<NewOwner>ID`.
///
/// All three sub-steps are always attempted; each reports independently and
/// a later step fails safely if an earlier one left nothing to work on.
pub struct ManyManyMigrator<'a, E: ?Sized> {
    executor: &'a E,
}

impl<'a, E: SqlExecutor + ?Sized> ManyManyMigrator<'a, E> {
    /// Create a migrator over `executor`.
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    /// Join table names `(current, new)` for a relation.
    pub fn tables(owner_current: &str, owner_new: &str, field_name: &str) -> (String, String) {
        (
            format!("{}_{}", owner_current, field_name),
            format!("{}_{}", owner_new, field_name),
        )
    }

    /// Run the drop, table rename and key rename for one relation.
    pub fn migrate_many_many(
        &self,
        owner_current: &str,
        owner_new: &str,
        field_name: &str,
    ) -> StepResult {
        let (table_current, table_new) = Self::tables(owner_current, owner_new, field_name);
        tracing::info!(from = %table_current, to = %table_new, "migrating many_many");

        let dropped = if self.already_moved(&table_current, &table_new) {
            let missing = MigrationError::NotFound {
                object: format!("{} table", table_current),
            };
            StepResult::skipped_by(
                StepKind::DropTable,
                vec![table_new.clone()],
                format!(
                    "{} table kept: {} was already renamed to it",
                    table_new, table_current
                ),
                &missing,
            )
        } else {
            TableDropper::new(self.executor).drop_if_empty(&table_new)
        };

        let renamed = TableRenamer::new(self.executor).rename(&table_current, &table_new);

        let key_current = format!("{}ID", owner_current);
        let key_new = format!("{}ID", owner_new);
        let relabeled =
            FieldRenamer::new(self.executor).rename_field(&table_new, &key_current, &key_new);

        StepResult::composite(
            StepKind::ManyMany,
            vec![table_current.clone(), table_new.clone()],
            format!("Migrating many many: {} to {}", table_current, table_new),
            vec![dropped, renamed, relabeled],
        )
    }

    /// Whether a previous run already renamed the join table. A table that
    /// exists only under the new name is a finished rename, never a drop
    /// candidate, even when empty.
    fn already_moved(&self, table_current: &str, table_new: &str) -> bool {
        let (Ok(current), Ok(new)) = (Ident::new(table_current), Ident::new(table_new)) else {
            return false;
        };
        let probe = SchemaProbe::new(self.executor);
        match (probe.table_exists(&current), probe.table_exists(&new)) {
            (Ok(false), Ok(true)) => true,
            (Ok(_), Ok(_)) => false,
            (Err(e), _) | (_, Err(e)) => {
                tracing::debug!(error = %e, "join table probe failed");
                false
            }
        }
    }
}
