//! Runs a [`MigrationSet`] group by group and collects the report.

use super::{ManyManyMigrator, RelationMigrator, TableDropper};
use crate::directive::{DirectiveGroup, MigrationDirective, MigrationSet};
use crate::report::{MigrationReport, StepResult, StepStatus};
use crate::sql::{RecordingExecutor, SqlExecutor};

/// Engine configuration.
#[derive(Debug, Clone, Default)]
pub struct MigrationConfig {
    /// Probe and read the live schema, but withhold every mutating statement.
    pub dry_run: bool,
}

impl MigrationConfig {
    /// Enable or disable dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Applies migration directives against one database connection.
///
/// Holds no state between runs. A failing directive never stops the run:
/// every directive is attempted exactly once and reported.
pub struct MigrationEngine<E> {
    executor: E,
    config: MigrationConfig,
}

impl<E: SqlExecutor> MigrationEngine<E> {
    /// Create an engine.
    pub fn new(executor: E, config: MigrationConfig) -> Self {
        Self { executor, config }
    }

    /// Apply every directive in `set`, removal first, then db_field, has_one
    /// and many_many.
    pub fn run(&self, set: &MigrationSet) -> MigrationReport {
        tracing::info!(
            directives = set.len(),
            dry_run = self.config.dry_run,
            "starting migration run"
        );

        let mut report = MigrationReport::begin(self.config.dry_run);
        if self.config.dry_run {
            let recorder = RecordingExecutor::dry_run(&self.executor);
            Self::apply(&recorder, set, &mut report);
            report.set_planned_statements(recorder.mutations());
        } else {
            Self::apply(&self.executor, set, &mut report);
        }
        let report = report.finish();

        let summary = report.summary();
        tracing::info!(
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            "migration run finished"
        );
        report
    }

    fn apply<X: SqlExecutor + ?Sized>(executor: &X, set: &MigrationSet, report: &mut MigrationReport) {
        for group in DirectiveGroup::ORDER {
            let directives = set.group(group);
            if directives.is_empty() {
                continue;
            }
            tracing::info!(group = %group, count = directives.len(), "{}", group.title());

            for directive in &directives {
                let step = Self::dispatch(executor, directive);
                Self::log_step(group, &step);
                report.push(group, step);
            }
        }
    }

    fn dispatch<X: SqlExecutor + ?Sized>(executor: &X, directive: &MigrationDirective) -> StepResult {
        match directive {
            MigrationDirective::RemoveTable(d) => {
                TableDropper::new(executor).drop_if_empty(&d.table_name)
            }
            MigrationDirective::FieldMove(d) => RelationMigrator::new(executor).migrate_field(
                &d.owner_current,
                &d.owner_new,
                &d.field_name_current,
                &d.field_name_new,
                &d.field_type,
            ),
            MigrationDirective::ManyMany(d) => ManyManyMigrator::new(executor).migrate_many_many(
                &d.owner_current,
                &d.owner_new,
                &d.field_name,
            ),
        }
    }

    fn log_step(group: DirectiveGroup, step: &StepResult) {
        let subjects = step.subjects().join(", ");
        match step.status() {
            StepStatus::Success => {
                tracing::info!(group = %group, kind = %step.kind(), subjects = %subjects, "{}", step.message())
            }
            StepStatus::Skipped => {
                tracing::debug!(group = %group, kind = %step.kind(), subjects = %subjects, "{}", step.message())
            }
            StepStatus::Failed => tracing::warn!(
                group = %group,
                kind = %step.kind(),
                subjects = %subjects,
                cause = step.cause().unwrap_or_default(),
                "{}",
                step.message()
            ),
        }
    }
}
