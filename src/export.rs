//! Output rendering (aligned table / JSON / CSV)
//!
//! Pure serialization functions, no I/O. The caller prints the returned
//! string.

use crate::db::types::{ColumnDescriptor, DataPage};
use crate::error::CommandError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use unicode_truncate::UnicodeTruncateStr;
use unicode_width::UnicodeWidthStr;

/// Output format selector
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" | "t" => Ok(OutputFormat::Table),
            "json" | "j" => Ok(OutputFormat::Json),
            "csv" | "c" => Ok(OutputFormat::Csv),
            other => Err(CommandError::InvalidArgument(format!(
                "unknown format '{}' (expected table, json or csv)",
                other
            ))),
        }
    }
}

/// Headers plus rows of optional display strings (`None` = SQL NULL)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl From<&DataPage> for Grid {
    fn from(page: &DataPage) -> Self {
        Self {
            headers: page.columns.clone(),
            rows: page
                .rows
                .iter()
                .map(|row| {
                    row.values
                        .iter()
                        .map(|v| (!v.is_null()).then(|| v.display().to_string()))
                        .collect()
                })
                .collect(),
        }
    }
}

impl Grid {
    /// Structure view; a NULL default stays `None` so the table shows `NULL`
    pub fn from_structure(columns: &[ColumnDescriptor]) -> Self {
        Self {
            headers: ["column_name", "data_type", "nullable", "column_default"]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            rows: columns
                .iter()
                .map(|c| {
                    vec![
                        Some(c.name.clone()),
                        Some(c.data_type.clone()),
                        Some(if c.nullable { "YES" } else { "NO" }.to_string()),
                        c.default.clone(),
                    ]
                })
                .collect(),
        }
    }

    /// Single-column grid, one row per item
    pub fn single_column(header: &str, items: &[String]) -> Self {
        Self {
            headers: vec![header.to_string()],
            rows: items.iter().map(|item| vec![Some(item.clone())]).collect(),
        }
    }
}

pub fn render(grid: &Grid, format: OutputFormat, max_cell_width: usize) -> String {
    match format {
        OutputFormat::Table => to_table(grid, max_cell_width),
        OutputFormat::Json => to_json(grid),
        OutputFormat::Csv => to_csv(grid),
    }
}

/// Render an aligned text table with a row-count footer.
pub fn to_table(grid: &Grid, max_cell_width: usize) -> String {
    let cells: Vec<Vec<String>> = grid
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| truncate_cell(cell.as_deref().unwrap_or("NULL"), max_cell_width))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = grid.headers.iter().map(|h| h.width()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.width());
            }
        }
    }

    let mut out = String::new();
    if !grid.headers.is_empty() {
        push_line(&mut out, &grid.headers, &widths);
        let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&separator.join("-+-"));
        out.push('\n');
        for row in &cells {
            push_line(&mut out, row, &widths);
        }
    }

    let n = grid.rows.len();
    out.push_str(&format!("({} {})", n, if n == 1 { "row" } else { "rows" }));
    out
}

/// Serialize rows as a JSON array of objects; keys keep column order.
pub fn to_json(grid: &Grid) -> String {
    let rows: Vec<serde_json::Value> = grid
        .rows
        .iter()
        .map(|row| {
            let mut obj = serde_json::Map::new();
            for (header, cell) in grid.headers.iter().zip(row) {
                let value = match cell {
                    Some(s) => serde_json::Value::String(s.clone()),
                    None => serde_json::Value::Null,
                };
                obj.insert(header.clone(), value);
            }
            serde_json::Value::Object(obj)
        })
        .collect();

    serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
}

/// Serialize rows as RFC 4180 CSV (NULL → empty field).
pub fn to_csv(grid: &Grid) -> String {
    let mut out = String::new();

    for (i, header) in grid.headers.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        csv_escape_into(&mut out, header);
    }
    out.push('\n');

    for row in &grid.rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            csv_escape_into(&mut out, cell.as_deref().unwrap_or(""));
        }
        out.push('\n');
    }

    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{}{}", cell, " ".repeat(w.saturating_sub(cell.width()))))
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}

/// Flatten control whitespace and cut to `max` display columns
fn truncate_cell(s: &str, max: usize) -> String {
    let flat: String = s
        .chars()
        .map(|c| if c == '\n' || c == '\r' || c == '\t' { ' ' } else { c })
        .collect();
    if flat.width() <= max {
        return flat;
    }
    let (cut, _) = flat.unicode_truncate(max.saturating_sub(3));
    format!("{}...", cut)
}

/// Quote a field if it contains `,` `"` or a newline (RFC 4180).
fn csv_escape_into(out: &mut String, field: &str) {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        out.push('"');
        for c in field.chars() {
            if c == '"' {
                out.push_str("\"\"");
            } else {
                out.push(c);
            }
        }
        out.push('"');
    } else {
        out.push_str(field);
    }
}
