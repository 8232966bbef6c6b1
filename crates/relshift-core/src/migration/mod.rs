//! Relation migration engine.
//!
//! Each operation borrows a [`SqlExecutor`](crate::sql::SqlExecutor), checks
//! the live schema with explicit existence probes, and folds every outcome,
//! including backend errors, into a [`StepResult`](crate::report::StepResult).
//! Operations are safe to re-run: work that is already done is reported as
//! skipped.
//!
//! | Operation | Skips when | Refuses when |
//! |-----------|-----------|--------------|
//! | [`TableDropper`] | table is gone | table has rows |
//! | [`TableRenamer`] | source table is gone | destination exists |
//! | [`FieldRenamer`] | column already renamed | both names exist |
//! | [`RelationMigrator`] | destination missing, or already moved | - |
//! | [`ManyManyMigrator`] | all three sub-steps skip | - |
//!
//! # Example
//!
//! ```ignore
//! use relshift_core::{MigrationConfig, MigrationEngine, MigrationSet, ManyMany};
//! use relshift_core::sql::SqliteExecutor;
//!
//! let db = SqliteExecutor::open("site.db")?;
//! let set = MigrationSet::new().with_many_many(ManyMany::new("Page", "NewsPage", "Categories"));
//! let report = MigrationEngine::new(db, MigrationConfig::default()).run(&set);
//! assert!(!report.has_failures());
//! ```

pub mod dropper;
pub mod many_many;
pub mod orchestrator;
mod probe;
pub mod relation;
pub mod renamer;

pub use dropper::TableDropper;
pub use many_many::ManyManyMigrator;
pub use orchestrator::{MigrationConfig, MigrationEngine};
pub use relation::{RelationMigrator, OBSOLETE_PREFIX};
pub use renamer::{FieldRenamer, TableRenamer};
