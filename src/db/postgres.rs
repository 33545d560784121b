//! PostgreSQL database provider
//!
//! Concrete implementation using tokio-postgres behind a bb8 pool.

use crate::config::{ConnectionConfig, Settings};
use crate::db::Database;
use crate::db::pool::{self, PgPool};
use crate::db::query::{
    COLUMN_TYPES_SQL, CatalogColumn, LIST_TABLES_SQL, Projection, STRUCTURE_SQL,
    TABLE_EXISTS_SQL, TableRef, build_select, count_sql,
};
use crate::db::types::{CellValue, ColumnDescriptor, DataPage, DataRequest, Row};
use crate::error::{DbError, DbResult};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use std::future::Future;
use std::time::Duration;
use tokio_postgres::Client;
use tracing::{debug, info, warn};

/// PostgreSQL database provider
pub struct PostgresProvider {
    pool: PgPool,
    /// Deadline applied to every call
    query_timeout: Duration,
    /// `user@host:port/db`, for logs
    target: String,
}

impl PostgresProvider {
    async fn timed<T>(&self, fut: impl Future<Output = DbResult<T>>) -> DbResult<T> {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(result) => {
                result.inspect_err(|e| debug!(db = %self.target, error = %e, "query failed"))
            }
            Err(_) => {
                warn!(db = %self.target, timeout = ?self.query_timeout, "query timed out");
                Err(DbError::Timeout)
            }
        }
    }

    async fn fetch_tables(&self) -> DbResult<Vec<String>> {
        let conn = pool::checkout(&self.pool).await?;
        let rows = conn.query(LIST_TABLES_SQL, &[]).await?;
        rows.iter()
            .map(|row| -> DbResult<String> {
                let schema: String = row.try_get(0)?;
                let name: String = row.try_get(1)?;
                Ok(TableRef::new(schema, name).to_string())
            })
            .collect()
    }

    async fn fetch_structure(&self, table: &str) -> DbResult<Vec<ColumnDescriptor>> {
        let conn = pool::checkout(&self.pool).await?;
        let table = resolve_table(&conn, table).await?;
        let rows = conn
            .query(STRUCTURE_SQL, &[&table.schema, &table.name])
            .await?;

        rows.iter()
            .map(|row| -> DbResult<ColumnDescriptor> {
                let nullable: String = row.try_get(2)?;
                Ok(ColumnDescriptor {
                    name: row.try_get(0)?,
                    data_type: row.try_get(1)?,
                    nullable: nullable == "YES",
                    default: row.try_get(3)?,
                })
            })
            .collect()
    }

    async fn fetch_page(&self, request: &DataRequest) -> DbResult<DataPage> {
        let conn = pool::checkout(&self.pool).await?;
        let table = resolve_table(&conn, &request.table).await?;
        let columns = catalog_columns(&conn, &table).await?;
        let sql = build_select(&table, &columns, request)?;
        debug!(%sql, "listing data");

        let stmt = conn.prepare(&sql).await?;
        let names: Vec<String> = stmt
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect();

        let pg_rows = conn.query(&stmt, &[]).await?;
        let rows = pg_rows
            .iter()
            .map(|pg_row| -> DbResult<Row> {
                let values = columns
                    .iter()
                    .enumerate()
                    .map(|(i, column)| extract_cell_value(pg_row, i, column))
                    .collect::<DbResult<_>>()?;
                Ok(Row { values })
            })
            .collect::<DbResult<_>>()?;

        Ok(DataPage {
            columns: names,
            rows,
            offset: request.offset,
            limit: request.limit,
        })
    }

    async fn fetch_count(&self, table: &str) -> DbResult<i64> {
        let conn = pool::checkout(&self.pool).await?;
        let table = resolve_table(&conn, table).await?;
        let sql = count_sql(&table);
        debug!(%sql, "counting rows");
        let row = conn.query_one(sql.as_str(), &[]).await?;
        Ok(row.try_get::<_, i64>(0)?)
    }
}

impl Database for PostgresProvider {
    async fn connect(config: &ConnectionConfig, settings: &Settings) -> DbResult<Self> {
        let target = config.display_target();
        let pool = pool::connect_pool(config, settings)
            .await
            .inspect_err(|e| warn!(db = %target, error = %e, "unable to connect to database"))?;

        info!(db = %target, pool_size = settings.pool_max_size, "connected to database");
        Ok(Self {
            pool,
            query_timeout: settings.query_timeout(),
            target,
        })
    }

    fn close(self) {
        info!(db = %self.target, "closing connection pool");
        drop(self.pool);
    }

    async fn list_tables(&self) -> DbResult<Vec<String>> {
        self.timed(self.fetch_tables()).await
    }

    async fn list_structure(&self, table: &str) -> DbResult<Vec<ColumnDescriptor>> {
        self.timed(self.fetch_structure(table)).await
    }

    async fn list_data(&self, request: &DataRequest) -> DbResult<DataPage> {
        self.timed(self.fetch_page(request)).await
    }

    async fn count_rows(&self, table: &str) -> DbResult<i64> {
        self.timed(self.fetch_count(table)).await
    }
}

/// Check a user-supplied table name against pg_catalog.
///
/// An unquoted `a.b` is tried as schema `a` first, then as the `public`
/// table `a.b`.
async fn resolve_table(client: &Client, input: &str) -> DbResult<TableRef> {
    let candidates = [Some(TableRef::parse(input)?), TableRef::unqualified_fallback(input)];
    for table in candidates.into_iter().flatten() {
        let found = client
            .query_opt(TABLE_EXISTS_SQL, &[&table.schema, &table.name])
            .await?;
        if found.is_some() {
            return Ok(table);
        }
    }
    Err(DbError::UnknownTable(input.trim().to_string()))
}

async fn catalog_columns(client: &Client, table: &TableRef) -> DbResult<Vec<CatalogColumn>> {
    let rows = client
        .query(COLUMN_TYPES_SQL, &[&table.schema, &table.name])
        .await?;
    rows.iter()
        .map(|row| -> DbResult<CatalogColumn> {
            Ok(CatalogColumn {
                name: row.try_get(0)?,
                data_type: row.try_get(1)?,
                udt_name: row.try_get(2)?,
            })
        })
        .collect()
}

/// Extract a cell from a page row.
///
/// Every column was selected as `::text`; the catalog type decides which
/// kind of cell the text becomes.
fn extract_cell_value(
    row: &tokio_postgres::Row,
    idx: usize,
    column: &CatalogColumn,
) -> DbResult<CellValue> {
    let text: Option<String> = row.try_get(idx).map_err(|e| {
        DbError::TypeConversion(format!("column '{}' ({}): {}", column.name, column.data_type, e))
    })?;
    Ok(cell_from_text(text, column))
}

fn cell_from_text(text: Option<String>, column: &CatalogColumn) -> CellValue {
    let Some(text) = text else {
        return CellValue::Null;
    };
    match column.projection() {
        Projection::Numeric => CellValue::Number(text),
        Projection::Timestamp { zoned } => CellValue::Timestamp(timestamp_text(text, zoned)),
        Projection::Text => CellValue::Text(text),
    }
}

/// Server text (`2024-01-01 00:00:00+00`, ISO DateStyle) to RFC 3339 UTC.
///
/// Values chrono cannot represent (`infinity`, BC dates) keep the
/// server's text.
fn timestamp_text(text: String, zoned: bool) -> String {
    let parsed = if zoned {
        DateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f%#z").map(|ts| ts.with_timezone(&Utc))
    } else {
        NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f").map(|ts| ts.and_utc())
    };
    match parsed {
        Ok(ts) => rfc3339(ts),
        Err(_) => text,
    }
}

/// RFC 3339 in UTC, whole seconds, `Z` suffix
fn rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}
