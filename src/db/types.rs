//! Database type definitions
//!
//! Core data structures for column descriptors, data pages and the
//! display values they carry.

use crate::error::{DbError, DbResult};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A string-keyed view of one row, as handed to the UI layer
pub type RowMap = HashMap<String, String>;

/// A cell value (single column value in a row)
///
/// Every non-null variant already holds its display text; the variant
/// records where the text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    /// NULL value
    Null,

    /// Text, or any type the query cast to text
    Text(String),

    /// Numeric column, in the server's own text (`42`, `NaN`, `Infinity`)
    Number(String),

    /// Timestamp rendered as RFC 3339, or the server's text (`infinity`)
    /// when it has no RFC 3339 form
    Timestamp(String),
}

impl CellValue {
    /// Display text for this cell; NULL renders as the literal `NULL`
    pub fn display(&self) -> &str {
        match self {
            CellValue::Null => "NULL",
            CellValue::Text(s) | CellValue::Number(s) | CellValue::Timestamp(s) => s,
        }
    }

    /// Check if this is a NULL value
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

/// Column descriptor read from `information_schema.columns`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Declared type as the catalog spells it (e.g. "character varying")
    pub data_type: String,
    pub nullable: bool,
    /// Default expression, `None` when the catalog value is NULL
    pub default: Option<String>,
}

impl ColumnDescriptor {
    /// Row-map view with keys `column_name`, `data_type`, `nullable`, `column_default`
    pub fn to_row_map(&self) -> RowMap {
        let mut row = RowMap::with_capacity(4);
        row.insert("column_name".to_string(), self.name.clone());
        row.insert("data_type".to_string(), self.data_type.clone());
        row.insert(
            "nullable".to_string(),
            if self.nullable { "YES" } else { "NO" }.to_string(),
        );
        row.insert(
            "column_default".to_string(),
            self.default.clone().unwrap_or_default(),
        );
        row
    }
}

/// A single row of a data page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Cell values in column order
    pub values: Vec<CellValue>,
}

/// One page of table data
#[derive(Debug, Clone)]
pub struct DataPage {
    /// Column names in driver field order
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub offset: u64,
    pub limit: u32,
}

impl DataPage {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Convert every row into a column-name → display-string map
    pub fn row_maps(&self) -> Vec<RowMap> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(&row.values)
                    .map(|(col, val)| (col.clone(), val.display().to_string()))
                    .collect()
            })
            .collect()
    }
}

/// Sort direction for a data page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = DbError;

    fn from_str(s: &str) -> DbResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(DbError::InvalidArgument(format!(
                "sort direction must be ASC or DESC, got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Ordering requested for a data page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub column: String,
    pub direction: SortDirection,
}

/// Parameters of a data listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRequest {
    pub table: String,
    pub sort: Option<Sort>,
    pub offset: u64,
    pub limit: u32,
}

impl DataRequest {
    pub fn new(table: impl Into<String>, limit: u32) -> Self {
        Self {
            table: table.into(),
            sort: None,
            offset: 0,
            limit,
        }
    }

    pub fn with_sort(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(Sort {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Build a request from the loosely-typed arguments a frontend sends.
    ///
    /// An empty direction means "no ordering", whatever the column says.
    pub fn from_ui(
        table: &str,
        column: &str,
        direction: &str,
        offset: u64,
        limit: u32,
    ) -> DbResult<Self> {
        let request = Self::new(table, limit).with_offset(offset);
        if direction.trim().is_empty() {
            return Ok(request);
        }
        if column.trim().is_empty() {
            return Err(DbError::InvalidArgument(
                "sort direction given without a column".to_string(),
            ));
        }
        Ok(request.with_sort(column.trim(), direction.parse()?))
    }
}
