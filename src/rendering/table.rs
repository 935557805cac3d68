//! Title lines and the per-match table.

use crate::models::{ClassifiedRow, SlipFlags, SlipReport};
use crate::{Error, Result};
use std::fmt::Write;

/// Longest match label shown untruncated.
pub const MATCH_COLUMN_MAX: usize = 34;

const MATCH_COLUMN_WIDTH: usize = 36;
const RULE_WIDTH: usize = 60;

/// Output format for submit results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Title lines and a table.
    #[default]
    Text,
    /// The report serialized as JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for anything other than `text` or `json`.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(Error::InvalidInput(format!(
                "unknown output format '{other}' (expected text or json)"
            ))),
        }
    }
}

/// Summary lines for a slip, most severe first.
///
/// Every raised flag contributes a line; a clean slip gets a single
/// confirmation line.
#[must_use]
pub fn title_lines(flags: &SlipFlags) -> Vec<&'static str> {
    let mut lines = Vec::with_capacity(3);
    if flags.identical_slip_seen {
        lines.push("This exact slip was submitted before.");
    }
    if flags.any_dup_in_slip {
        lines.push("This slip contains duplicated matches.");
    }
    if flags.any_seen_before {
        lines.push("Some matches already appear in active slips.");
    }
    if lines.is_empty() {
        lines.push("Slip recorded, no duplicates found.");
    }
    lines
}

/// Renders the per-match table.
#[must_use]
pub fn render_table(rows: &[ClassifiedRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<2} {:<MATCH_COLUMN_WIDTH$} {:<6} {:<9}",
        "#", "Match", "Dup", "Seen"
    );
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));

    for (index, row) in rows.iter().enumerate() {
        let label = truncate_label(&format!("{} vs {}", row.team_a, row.team_b));
        let dup = if row.dup_in_slip { "yes" } else { "no" };
        let seen = if row.seen_before { "yes" } else { "-" };
        let _ = writeln!(
            out,
            "{:<2} {:<MATCH_COLUMN_WIDTH$} {:<6} {:<9}",
            index + 1,
            label,
            dup,
            seen
        );
    }

    out.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}

/// Renders title lines followed by the table.
#[must_use]
pub fn render_report(report: &SlipReport) -> String {
    let mut out = title_lines(&report.flags).join("\n");
    out.push('\n');
    out.push_str(&render_table(&report.rows));
    out
}

/// Renders the report as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if serialization fails.
pub fn render_json(report: &SlipReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(|e| Error::OperationFailed {
        operation: "render_json".to_string(),
        cause: e.to_string(),
    })
}

fn truncate_label(label: &str) -> String {
    if label.chars().count() <= MATCH_COLUMN_MAX {
        return label.to_string();
    }
    let mut short: String = label.chars().take(MATCH_COLUMN_MAX - 1).collect();
    short.push('…');
    short
}
