//! relshift core - idempotent relation and table migrations.
//!
//! Reads an ordered [`MigrationSet`] and applies it to a live schema through a
//! [`SqlExecutor`](sql::SqlExecutor), producing a [`MigrationReport`] with one
//! result per directive. Every step checks the schema before acting, so a
//! batch can be re-run after a partial failure.

pub mod config;
pub mod directive;
pub mod error;
pub mod migration;
pub mod report;
pub mod sql;

pub use config::{load_migration_set, ConfigError};
pub use directive::{
    DirectiveGroup, FieldMove, HasOne, ManyMany, MigrationDirective, MigrationSet, RemoveTable,
};
pub use error::{ErrorKind, MigrationError};
pub use migration::{
    FieldRenamer, ManyManyMigrator, MigrationConfig, MigrationEngine, RelationMigrator,
    TableDropper, TableRenamer, OBSOLETE_PREFIX,
};
pub use report::{MigrationReport, ReportEntry, ReportSummary, StepKind, StepResult, StepStatus};
pub use sql::{Dialect, SqlError, SqlExecutor, SqlValue};
