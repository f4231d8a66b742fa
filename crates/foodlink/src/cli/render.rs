//! Text rendering of result sets.

use serde_json::Value;

use super::commands::OutputFormat;
use crate::error::Result;
use crate::queries::ResultSet;

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_table(result: &ResultSet) -> String {
    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.chars().count()).collect();
    let rows: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&result.title);
    out.push('\n');
    out.push_str(&"=".repeat(result.title.chars().count()));
    out.push('\n');
    out.push_str(&line(&result.columns));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.push('\n');
    if rows.is_empty() {
        out.push_str("(no rows)\n");
    }
    for row in &rows {
        out.push_str(&line(row));
        out.push('\n');
    }
    out
}

fn render_plain(result: &ResultSet) -> String {
    let mut out = result.columns.join("\t");
    out.push('\n');
    for row in &result.rows {
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
    out
}

/// Render a result set in the requested format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(result: &ResultSet, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(result)),
        OutputFormat::Plain => Ok(render_plain(result)),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&result.to_objects())?;
            json.push('\n');
            Ok(json)
        }
    }
}
