//! In-memory database used by unit tests

use crate::config::{ConnectionConfig, Settings};
use crate::db::Database;
use crate::db::types::{
    CellValue, ColumnDescriptor, DataPage, DataRequest, Row, SortDirection,
};
use crate::error::{DbError, DbResult};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Database name that makes `connect` fail
pub const UNREACHABLE_DB: &str = "unreachable";

pub const USERS_ROWS: usize = 120;

pub struct MockTable {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Vec<CellValue>>,
}

pub struct MockDatabase {
    pub tables: BTreeMap<String, MockTable>,
}

fn column(name: &str, data_type: &str, nullable: bool, default: Option<&str>) -> ColumnDescriptor {
    ColumnDescriptor {
        name: name.to_string(),
        data_type: data_type.to_string(),
        nullable,
        default: default.map(String::from),
    }
}

impl MockDatabase {
    /// `users` with 120 rows (even ids have a NULL bio) and an empty `audit.events`
    pub fn fixture() -> Self {
        let users = MockTable {
            columns: vec![
                column("id", "integer", false, Some("nextval('users_id_seq'::regclass)")),
                column("name", "text", false, None),
                column("created_at", "timestamp with time zone", false, Some("now()")),
                column("bio", "text", true, None),
            ],
            rows: (1..=USERS_ROWS)
                .map(|i| {
                    vec![
                        CellValue::Number(i.to_string()),
                        CellValue::Text(format!("user{:03}", i)),
                        CellValue::Timestamp("2024-01-01T00:00:00Z".to_string()),
                        if i % 2 == 0 {
                            CellValue::Null
                        } else {
                            CellValue::Text(String::new())
                        },
                    ]
                })
                .collect(),
        };
        let events = MockTable {
            columns: vec![column("payload", "jsonb", true, None)],
            rows: Vec::new(),
        };

        let mut tables = BTreeMap::new();
        tables.insert("users".to_string(), users);
        tables.insert("audit.events".to_string(), events);
        Self { tables }
    }

    fn table(&self, name: &str) -> DbResult<&MockTable> {
        self.tables
            .get(name.trim())
            .ok_or_else(|| DbError::UnknownTable(name.trim().to_string()))
    }
}

fn compare_cells(a: &CellValue, b: &CellValue) -> Ordering {
    match (a, b) {
        (CellValue::Number(x), CellValue::Number(y)) => {
            let x: f64 = x.parse().unwrap_or(f64::NAN);
            let y: f64 = y.parse().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        // Postgres sorts NULLs last in ascending order
        (CellValue::Null, CellValue::Null) => Ordering::Equal,
        (CellValue::Null, _) => Ordering::Greater,
        (_, CellValue::Null) => Ordering::Less,
        _ => a.display().cmp(b.display()),
    }
}

impl Database for MockDatabase {
    async fn connect(config: &ConnectionConfig, _settings: &Settings) -> DbResult<Self> {
        if config.database == UNREACHABLE_DB {
            return Err(DbError::ConnectionFailed("connection refused".to_string()));
        }
        Ok(Self::fixture())
    }

    async fn list_tables(&self) -> DbResult<Vec<String>> {
        Ok(self.tables.keys().cloned().collect())
    }

    async fn list_structure(&self, table: &str) -> DbResult<Vec<ColumnDescriptor>> {
        Ok(self.table(table)?.columns.clone())
    }

    async fn list_data(&self, request: &DataRequest) -> DbResult<DataPage> {
        let table = self.table(&request.table)?;
        let mut rows = table.rows.clone();

        if let Some(sort) = &request.sort {
            let idx = table
                .columns
                .iter()
                .position(|c| c.name == sort.column)
                .ok_or_else(|| DbError::UnknownColumn {
                    table: request.table.clone(),
                    column: sort.column.clone(),
                })?;
            rows.sort_by(|a, b| {
                let ord = compare_cells(&a[idx], &b[idx]);
                match sort.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }

        let rows = rows
            .into_iter()
            .skip(request.offset as usize)
            .take(request.limit as usize)
            .map(|values| Row { values })
            .collect();

        Ok(DataPage {
            columns: table.columns.iter().map(|c| c.name.clone()).collect(),
            rows,
            offset: request.offset,
            limit: request.limit,
        })
    }

    async fn count_rows(&self, table: &str) -> DbResult<i64> {
        Ok(self.table(table)?.rows.len() as i64)
    }
}
