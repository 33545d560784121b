//! Catalog queries and SELECT construction
//!
//! Identifiers cannot be bound as parameters, so every table and column
//! name that ends up in SQL text is read from the catalog first and then
//! double-quoted here.

use crate::db::types::DataRequest;
use crate::error::{DbError, DbResult};
use std::borrow::Cow;
use std::fmt;

/// User tables, excluding the system schemas
pub const LIST_TABLES_SQL: &str = "SELECT schemaname::text, tablename::text \
     FROM pg_catalog.pg_tables \
     WHERE schemaname != 'pg_catalog' AND schemaname != 'information_schema' \
     ORDER BY schemaname, tablename";

pub const TABLE_EXISTS_SQL: &str = "SELECT 1 FROM pg_catalog.pg_tables \
     WHERE schemaname = $1 AND tablename = $2";

pub const STRUCTURE_SQL: &str =
    "SELECT column_name::text, data_type::text, is_nullable::text, column_default::text \
     FROM information_schema.columns \
     WHERE table_schema = $1 AND table_name = $2 \
     ORDER BY ordinal_position";

pub const COLUMN_TYPES_SQL: &str = "SELECT column_name::text, data_type::text, udt_name::text \
     FROM information_schema.columns \
     WHERE table_schema = $1 AND table_name = $2 \
     ORDER BY ordinal_position";

/// Types whose cells are tagged as numbers
pub const NUMERIC_TYPES: [&str; 9] = [
    "integer",
    "bigint",
    "smallint",
    "decimal",
    "numeric",
    "real",
    "double precision",
    "serial",
    "bigserial",
];

pub const TIMESTAMPTZ_TYPE: &str = "timestamp with time zone";
pub const TIMESTAMP_TYPE: &str = "timestamp without time zone";

const DEFAULT_SCHEMA: &str = "public";

/// How a column's server-side text is interpreted.
///
/// Every column is selected as `::text`, so `NaN`, `Infinity`, numerics
/// wider than any Rust decimal and `infinity` timestamps keep the exact
/// text Postgres gives them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Passed through, tagged as a number
    Numeric,
    /// Reformatted as RFC 3339 UTC when chrono can read it
    Timestamp { zoned: bool },
    Text,
}

impl Projection {
    pub fn for_data_type(data_type: &str) -> Self {
        if NUMERIC_TYPES.contains(&data_type) {
            Projection::Numeric
        } else if data_type == TIMESTAMPTZ_TYPE {
            Projection::Timestamp { zoned: true }
        } else if data_type == TIMESTAMP_TYPE {
            Projection::Timestamp { zoned: false }
        } else {
            Projection::Text
        }
    }
}

/// A column as `information_schema.columns` describes it for data listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogColumn {
    pub name: String,
    pub data_type: String,
    pub udt_name: String,
}

impl CatalogColumn {
    pub fn projection(&self) -> Projection {
        Projection::for_data_type(&self.data_type)
    }

    fn select_expr(&self) -> String {
        let ident = quote_ident(&self.name);
        tracing::trace!(
            column = %self.name,
            data_type = %self.data_type,
            udt = %self.udt_name,
            projection = ?self.projection(),
            "projecting column"
        );
        format!("{ident}::text AS {ident}")
    }
}

/// A schema-qualified table name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Parse `schema.table` or a bare `table` (which lives in `public`).
    ///
    /// Either part may be double-quoted, so `"a.b"` names the `public`
    /// table `a.b`. A bare second part runs to the end of the input.
    pub fn parse(input: &str) -> DbResult<Self> {
        let input = input.trim();
        let invalid = || DbError::InvalidArgument(format!("invalid table name '{}'", input));

        let (first, rest) = read_ident(input).ok_or_else(invalid)?;
        let (schema, name) = match rest {
            None => (DEFAULT_SCHEMA.to_string(), first),
            Some(rest) if rest.starts_with('"') => match read_ident(rest) {
                Some((name, None)) => (first, name),
                _ => return Err(invalid()),
            },
            Some(rest) => (first, rest.to_string()),
        };
        if schema.is_empty() || name.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(schema, name))
    }

    /// The same name read as a single bare `public` table, for input like
    /// `a.b` that was not written with quotes
    pub fn unqualified_fallback(input: &str) -> Option<Self> {
        let input = input.trim();
        (input.contains('.') && !input.contains('"'))
            .then(|| Self::new(DEFAULT_SCHEMA, input))
    }

    /// Quoted `"schema"."table"` for SQL text
    pub fn qualified(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.name))
    }
}

/// Tables in `public` display bare, others as `schema.table`; a part that
/// would not parse back on its own is quoted
impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.schema == DEFAULT_SCHEMA {
            f.write_str(&display_ident(&self.name))
        } else {
            write!(f, "{}.{}", display_ident(&self.schema), display_ident(&self.name))
        }
    }
}

fn display_ident(ident: &str) -> Cow<'_, str> {
    if ident.contains(['.', '"']) || ident.trim() != ident {
        Cow::Owned(quote_ident(ident))
    } else {
        Cow::Borrowed(ident)
    }
}

/// Read one identifier from the front of `input`: a quoted one or a bare
/// one up to the first `.`. Returns it with whatever follows the
/// separating `.`, or `None` for malformed input.
fn read_ident(input: &str) -> Option<(String, Option<&str>)> {
    if !input.starts_with('"') {
        return Some(match input.split_once('.') {
            Some((ident, rest)) => (ident.to_string(), Some(rest)),
            None => (input.to_string(), None),
        });
    }

    let (ident, after) = split_quoted(input)?;
    match after.strip_prefix('.') {
        Some(rest) => Some((ident, Some(rest))),
        None if after.is_empty() => Some((ident, None)),
        None => None,
    }
}

/// Split a leading `"quoted identifier"` (`""` escapes a quote) from the
/// text after its closing quote. `None` if `input` is not quoted or the
/// quote is never closed.
pub fn split_quoted(input: &str) -> Option<(String, &str)> {
    let quoted = input.strip_prefix('"')?;
    let mut ident = String::new();
    let mut chars = quoted.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '"' {
            ident.push(c);
            continue;
        }
        if let Some((_, '"')) = chars.peek() {
            ident.push('"');
            chars.next();
            continue;
        }
        return Some((ident, &quoted[i + 1..]));
    }
    None
}

/// Build the page query for `request` over the table's catalog columns.
///
/// The sort column must be one of `columns`.
pub fn build_select(
    table: &TableRef,
    columns: &[CatalogColumn],
    request: &DataRequest,
) -> DbResult<String> {
    let parts: Vec<String> = columns.iter().map(CatalogColumn::select_expr).collect();

    let mut sql = format!("SELECT {} FROM {}", parts.join(", "), table.qualified());

    if let Some(sort) = &request.sort {
        if !columns.iter().any(|c| c.name == sort.column) {
            return Err(DbError::UnknownColumn {
                table: table.to_string(),
                column: sort.column.clone(),
            });
        }
        // Qualified so it names the table column, not the `::text` output alias
        sql.push_str(&format!(
            " ORDER BY {}.{} {}",
            table.qualified(),
            quote_ident(&sort.column),
            sort.direction.as_sql()
        ));
    }

    sql.push_str(&format!(
        " LIMIT {} OFFSET {}",
        request.limit, request.offset
    ));
    Ok(sql)
}

pub fn count_sql(table: &TableRef) -> String {
    format!("SELECT COUNT(*) FROM {}", table.qualified())
}
