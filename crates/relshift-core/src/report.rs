//! Step results and the run report handed to renderers.

use crate::directive::DirectiveGroup;
use crate::error::{ErrorKind, MigrationError};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The schema was changed.
    Success,
    /// Nothing needed doing, or doing it was refused as unsafe.
    Skipped,
    /// The step could not be completed.
    Failed,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Success => write!(f, "success"),
            StepStatus::Skipped => write!(f, "skipped"),
            StepStatus::Failed => write!(f, "failed"),
        }
    }
}

/// What a step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Drop of an empty table.
    DropTable,
    /// Table rename.
    RenameTable,
    /// Column rename.
    RenameField,
    /// Column data move between tables.
    MoveField,
    /// many_many move, made of three sub-steps.
    ManyMany,
    /// End-of-run marker.
    BatchComplete,
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepKind::DropTable => write!(f, "drop_table"),
            StepKind::RenameTable => write!(f, "rename_table"),
            StepKind::RenameField => write!(f, "rename_field"),
            StepKind::MoveField => write!(f, "move_field"),
            StepKind::ManyMany => write!(f, "many_many"),
            StepKind::BatchComplete => write!(f, "batch_complete"),
        }
    }
}

/// Result of one step. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    kind: StepKind,
    subjects: Vec<String>,
    status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    rows_affected: Option<u64>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sub_steps: Vec<StepResult>,
}

impl StepResult {
    fn build(kind: StepKind, subjects: Vec<String>, status: StepStatus, message: String) -> Self {
        Self {
            kind,
            subjects,
            status,
            rows_affected: None,
            message,
            cause: None,
            error_kind: None,
            sub_steps: Vec::new(),
        }
    }

    /// A step that changed the schema.
    pub fn success(kind: StepKind, subjects: Vec<String>, message: impl Into<String>) -> Self {
        Self::build(kind, subjects, StepStatus::Success, message.into())
    }

    /// A step that had nothing to do.
    pub fn skipped(kind: StepKind, subjects: Vec<String>, message: impl Into<String>) -> Self {
        Self::build(kind, subjects, StepStatus::Skipped, message.into())
    }

    /// A step refused or left undone because of `error`.
    pub fn skipped_by(
        kind: StepKind,
        subjects: Vec<String>,
        message: impl Into<String>,
        error: &MigrationError,
    ) -> Self {
        let mut step = Self::skipped(kind, subjects, message);
        step.cause = Some(error.to_string());
        step.error_kind = Some(error.kind());
        step
    }

    /// A failed step. The error text is kept verbatim as the cause.
    pub fn failed(
        kind: StepKind,
        subjects: Vec<String>,
        message: impl Into<String>,
        error: &MigrationError,
    ) -> Self {
        let mut step = Self::build(kind, subjects, StepStatus::Failed, message.into());
        step.cause = Some(error.to_string());
        step.error_kind = Some(error.kind());
        step
    }

    /// A many_many step wrapping its sub-steps.
    ///
    /// Fails if any sub-step failed, succeeds if any succeeded, and is
    /// skipped otherwise.
    pub fn composite(
        kind: StepKind,
        subjects: Vec<String>,
        message: impl Into<String>,
        sub_steps: Vec<StepResult>,
    ) -> Self {
        let status = if sub_steps.iter().any(|s| s.status == StepStatus::Failed) {
            StepStatus::Failed
        } else if sub_steps.iter().any(|s| s.status == StepStatus::Success) {
            StepStatus::Success
        } else {
            StepStatus::Skipped
        };
        let mut step = Self::build(kind, subjects, status, message.into());
        step.sub_steps = sub_steps;
        step
    }

    /// The terminal marker appended to every report.
    pub fn batch_complete() -> Self {
        Self::success(StepKind::BatchComplete, Vec::new(), "Finished!")
    }

    /// Attach a row count.
    pub fn with_rows(mut self, rows: u64) -> Self {
        self.rows_affected = Some(rows);
        self
    }

    /// What the step did.
    pub fn kind(&self) -> StepKind {
        self.kind
    }

    /// Tables (and columns) the step touched.
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    /// Outcome.
    pub fn status(&self) -> StepStatus {
        self.status
    }

    /// Rows copied, for field moves.
    pub fn rows_affected(&self) -> Option<u64> {
        self.rows_affected
    }

    /// Human readable summary.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Underlying error text, if any.
    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    /// Classification of the underlying error, if any.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }

    /// Sub-steps, in execution order.
    pub fn sub_steps(&self) -> &[StepResult] {
        &self.sub_steps
    }

    /// Whether the step succeeded.
    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }

    /// Whether the step was skipped.
    pub fn is_skipped(&self) -> bool {
        self.status == StepStatus::Skipped
    }

    /// Whether the step failed.
    pub fn is_failed(&self) -> bool {
        self.status == StepStatus::Failed
    }
}

/// A report line: a step and the group that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    /// Producing group; `None` for the terminal marker.
    pub group: Option<DirectiveGroup>,
    /// The step.
    pub step: StepResult,
}

/// Counts of top-level step outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    /// Steps that succeeded.
    pub succeeded: usize,
    /// Steps that were skipped.
    pub skipped: usize,
    /// Steps that failed.
    pub failed: usize,
}

/// Ordered results of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationReport {
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    dry_run: bool,
    entries: Vec<ReportEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    planned_statements: Vec<String>,
}

impl MigrationReport {
    /// Start an empty report.
    pub fn begin(dry_run: bool) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            entries: Vec::new(),
            planned_statements: Vec::new(),
        }
    }

    /// Append a step result.
    pub fn push(&mut self, group: DirectiveGroup, step: StepResult) {
        self.entries.push(ReportEntry {
            group: Some(group),
            step,
        });
    }

    /// Record the mutating statements a dry run would have issued.
    pub fn set_planned_statements(&mut self, statements: Vec<String>) {
        self.planned_statements = statements;
    }

    /// Append the terminal marker and stamp the finish time.
    pub fn finish(mut self) -> Self {
        self.entries.push(ReportEntry {
            group: None,
            step: StepResult::batch_complete(),
        });
        self.finished_at = Some(Utc::now());
        self
    }

    /// When the run started.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the run finished.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Whether mutations were withheld.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// All entries, terminal marker last.
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// Step results without their groups.
    pub fn steps(&self) -> impl Iterator<Item = &StepResult> {
        self.entries.iter().map(|e| &e.step)
    }

    /// Statements a dry run withheld.
    pub fn planned_statements(&self) -> &[String] {
        &self.planned_statements
    }

    /// Outcome counts, excluding the terminal marker.
    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();
        for step in self.steps().filter(|s| s.kind() != StepKind::BatchComplete) {
            match step.status() {
                StepStatus::Success => summary.succeeded += 1,
                StepStatus::Skipped => summary.skipped += 1,
                StepStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }

    /// Whether any step failed.
    pub fn has_failures(&self) -> bool {
        self.summary().failed > 0
    }
}
