//! Report rendering.
//!
//! Turns a [`SlipReport`](crate::SlipReport) into the text shown to users:
//! one or more title lines summarising the flags, followed by a per-match
//! table. JSON output is available for scripting.

mod table;

pub use table::{
    MATCH_COLUMN_MAX, OutputFormat, render_json, render_report, render_table, title_lines,
};
