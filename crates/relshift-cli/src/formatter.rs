//! Report renderers.

use clap::ValueEnum;
use comfy_table::{Cell, Color, Table};
use relshift_core::{DirectiveGroup, MigrationReport, StepKind, StepResult, StepStatus};

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// Plain text, one line per step
    Text,
    /// JSON format
    Json,
    /// HTML fragment
    Html,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Html => write!(f, "html"),
        }
    }
}

/// Trait for rendering a migration report.
pub trait ReportFormatter {
    /// Render the full report.
    fn format_report(&self, report: &MigrationReport) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn ReportFormatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Html => Box::new(HtmlFormatter),
    }
}

/// Report entries split into runs of the same group, in report order.
fn grouped(report: &MigrationReport) -> Vec<(Option<DirectiveGroup>, Vec<&StepResult>)> {
    let mut groups: Vec<(Option<DirectiveGroup>, Vec<&StepResult>)> = Vec::new();
    for entry in report.entries() {
        if let Some((group, steps)) = groups.last_mut() {
            if *group == entry.group {
                steps.push(&entry.step);
                continue;
            }
        }
        groups.push((entry.group, vec![&entry.step]));
    }
    groups
}

fn summary_line(report: &MigrationReport) -> String {
    let summary = report.summary();
    format!(
        "{} succeeded, {} skipped, {} failed{}",
        summary.succeeded,
        summary.skipped,
        summary.failed,
        if report.is_dry_run() { " (dry run)" } else { "" }
    )
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl TableFormatter {
    fn status_cell(status: StepStatus) -> Cell {
        let color = match status {
            StepStatus::Success => Color::Green,
            StepStatus::Skipped => Color::Yellow,
            StepStatus::Failed => Color::Red,
        };
        Cell::new(status).fg(color)
    }

    fn add_step(table: &mut Table, group: &str, step: &StepResult, indent: &str) {
        let rows = step
            .rows_affected()
            .map(|n| n.to_string())
            .unwrap_or_default();
        let mut message = step.message().to_string();
        if let Some(cause) = step.cause() {
            if cause != message {
                message.push_str(&format!("\n{}", cause));
            }
        }

        table.add_row(vec![
            Cell::new(group),
            Cell::new(format!("{}{}", indent, step.kind())),
            Cell::new(step.subjects().join(", ")),
            Self::status_cell(step.status()),
            Cell::new(rows),
            Cell::new(message),
        ]);
    }
}

impl ReportFormatter for TableFormatter {
    fn format_report(&self, report: &MigrationReport) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Group", "Step", "Subjects", "Status", "Rows", "Message"]);

        for entry in report.entries() {
            if entry.step.kind() == StepKind::BatchComplete {
                continue;
            }
            let group = entry.group.map(|g| g.key()).unwrap_or_default();
            Self::add_step(&mut table, group, &entry.step, "");
            for sub in entry.step.sub_steps() {
                Self::add_step(&mut table, "", sub, "  - ");
            }
        }

        let mut output = table.to_string();
        output.push_str(&format!("\nFinished! {}", summary_line(report)));
        for statement in report.planned_statements() {
            output.push_str(&format!("\n  {}", statement));
        }
        output
    }
}

/// Plain text formatter.
pub struct TextFormatter;

impl TextFormatter {
    fn line(step: &StepResult) -> String {
        let mut line = format!("[{}] {}", step.status(), step.message());
        if let Some(rows) = step.rows_affected() {
            line.push_str(&format!(" ({} row(s))", rows));
        }
        if let (StepStatus::Failed, Some(cause)) = (step.status(), step.cause()) {
            line.push_str(&format!(": {}", cause));
        }
        line
    }
}

impl ReportFormatter for TextFormatter {
    fn format_report(&self, report: &MigrationReport) -> String {
        let mut output = format!(
            "Migration started {}\n",
            report.started_at().format("%Y-%m-%d %H:%M:%S UTC")
        );

        for (group, steps) in grouped(report) {
            let Some(group) = group else {
                continue;
            };
            output.push_str(&format!("== {}\n", group.title()));
            for step in steps {
                output.push_str(&Self::line(step));
                output.push('\n');
                for (idx, sub) in step.sub_steps().iter().enumerate() {
                    output.push_str(&format!("  {}. {}\n", idx + 1, Self::line(sub)));
                }
            }
        }

        output.push_str(&format!("Finished! {}", summary_line(report)));
        if !report.planned_statements().is_empty() {
            output.push_str("\nPlanned statements:");
            for statement in report.planned_statements() {
                output.push_str(&format!("\n  {}", statement));
            }
        }
        output
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl ReportFormatter for JsonFormatter {
    fn format_report(&self, report: &MigrationReport) -> String {
        let mut value = serde_json::to_value(report).unwrap_or_else(|_| serde_json::json!({}));
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "summary".to_string(),
                serde_json::to_value(report.summary()).unwrap_or_default(),
            );
        }
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }
}

/// HTML formatter.
pub struct HtmlFormatter;

impl HtmlFormatter {
    fn step(step: &StepResult, tag: &str) -> String {
        let style = match step.status() {
            StepStatus::Success => " style='color: green'",
            StepStatus::Failed => " style='color: red'",
            StepStatus::Skipped => "",
        };
        let mut html = format!("<{tag}{style}>{}</{tag}>", escape_html(step.message()));
        if let (StepStatus::Failed, Some(cause)) = (step.status(), step.cause()) {
            html.push_str(&format!(
                "<ul><li>Errored with message: <span style='color: gray'>{}</span></li></ul>",
                escape_html(cause)
            ));
        }
        html
    }
}

impl ReportFormatter for HtmlFormatter {
    fn format_report(&self, report: &MigrationReport) -> String {
        let mut output = String::new();

        for (group, steps) in grouped(report) {
            let Some(group) = group else {
                continue;
            };
            output.push_str(&format!("<h2>{}</h2>\n", group.title()));
            for step in steps {
                if step.sub_steps().is_empty() {
                    output.push_str(&Self::step(step, "p"));
                    output.push('\n');
                    continue;
                }
                output.push_str(&format!("<p>{}</p>\n<ol>\n", escape_html(step.message())));
                for sub in step.sub_steps() {
                    output.push_str(&format!("<li>{}</li>\n", Self::step(sub, "em")));
                }
                output.push_str("</ol>\n");
            }
        }

        output.push_str(&format!(
            "<p>{}</p>\n<h2 style='font-size: 60px;'>Finished!  &#x1f37b;</h2>",
            escape_html(&summary_line(report))
        ));
        output
    }
}

/// Escape text for inclusion in HTML.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use relshift_core::MigrationError;

    fn sample_report() -> MigrationReport {
        let mut report = MigrationReport::begin(false);
        report.push(
            DirectiveGroup::RemoveTable,
            StepResult::success(
                StepKind::DropTable,
                vec!["OldTable".to_string()],
                "OldTable table deleted",
            ),
        );
        let err = MigrationError::NotFound {
            object: "Page_Tags.<PageID>".to_string(),
        };
        report.push(
            DirectiveGroup::ManyMany,
            StepResult::composite(
                StepKind::ManyMany,
                vec!["Page_Tags".to_string(), "NewsPage_Tags".to_string()],
                "Migrating many many: Page_Tags to NewsPage_Tags",
                vec![
                    StepResult::skipped(
                        StepKind::DropTable,
                        vec!["NewsPage_Tags".to_string()],
                        "NewsPage_Tags table already deleted",
                    ),
                    StepResult::success(
                        StepKind::RenameTable,
                        vec!["Page_Tags".to_string(), "NewsPage_Tags".to_string()],
                        "Page_Tags table renamed to NewsPage_Tags",
                    ),
                    StepResult::failed(
                        StepKind::RenameField,
                        vec!["NewsPage_Tags".to_string()],
                        "Failed. Field may not exist.",
                        &err,
                    ),
                ],
            ),
        );
        report.finish()
    }

    #[test]
    fn test_text_format() {
        let report = sample_report();
        let text = TextFormatter.format_report(&report);
        let started = report.started_at().format("%Y-%m-%d %H:%M:%S UTC").to_string();
        assert!(text.starts_with(&format!("Migration started {}\n== Removing", started)));
        assert!(text.contains("== Removing obsolete tables\n[success] OldTable table deleted"));
        assert!(text.contains("== Migrating many_many relations"));
        assert!(text.contains(
            "  3. [failed] Failed. Field may not exist.: Page_Tags.<PageID> does not exist"
        ));
        assert!(text.ends_with("Finished! 1 succeeded, 0 skipped, 1 failed"));
    }

    #[test]
    fn test_html_escapes_causes() {
        let html = HtmlFormatter.format_report(&sample_report());
        assert!(html.contains("<h2>Removing obsolete tables</h2>"));
        assert!(html.contains("<ol>"));
        assert!(html.contains("Page_Tags.&lt;PageID&gt; does not exist"));
        assert!(!html.contains("<PageID>"));
        assert!(html.ends_with("Finished!  &#x1f37b;</h2>"));
    }

    #[test]
    fn test_json_format() {
        let json = JsonFormatter.format_report(&sample_report());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summary"]["failed"], 1);
        assert_eq!(value["entries"][1]["group"], "many_many");
        assert_eq!(value["entries"][1]["step"]["sub_steps"][2]["status"], "failed");
        assert_eq!(value["entries"][2]["step"]["kind"], "batch_complete");
    }

    #[test]
    fn test_table_format() {
        let table = TableFormatter.format_report(&sample_report());
        assert!(table.contains("OldTable table deleted"));
        assert!(table.contains("  - rename_field"));
        assert!(table.contains("Finished! 1 succeeded, 0 skipped, 1 failed"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b & 'c'"), "a &lt; b &amp; &#39;c&#39;");
    }
}
