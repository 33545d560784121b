//! Database provider trait
//!
//! Defines the interface the browser service drives. This abstraction allows for:
//! - Easy testing with mock implementations
//! - Consistent error handling

use crate::config::{ConnectionConfig, Settings};
use crate::db::types::{ColumnDescriptor, DataPage, DataRequest};
use crate::error::DbResult;

/// Main database trait
///
/// Every operation returns an explicit error; an empty `Ok` always means
/// the catalog or table really is empty.
#[allow(async_fn_in_trait)]
pub trait Database: Sized {
    /// Open a connection (pool) and verify it answers a ping
    ///
    /// # Errors
    /// Returns `DbError::ConnectionFailed` if connection cannot be established
    async fn connect(config: &ConnectionConfig, settings: &Settings) -> DbResult<Self>;

    /// Release the underlying connections
    fn close(self) {}

    /// List user tables, excluding `pg_catalog` and `information_schema`
    async fn list_tables(&self) -> DbResult<Vec<String>>;

    /// Describe the columns of a table in ordinal order
    ///
    /// # Errors
    /// Returns `DbError::UnknownTable` if the table is not in the catalog
    async fn list_structure(&self, table: &str) -> DbResult<Vec<ColumnDescriptor>>;

    /// Fetch one page of table data
    ///
    /// # Errors
    /// Returns `DbError::UnknownTable` / `DbError::UnknownColumn` for names
    /// the catalog does not know, `DbError::QueryFailed` if execution fails
    async fn list_data(&self, request: &DataRequest) -> DbResult<DataPage>;

    /// Count the rows of a table
    async fn count_rows(&self, table: &str) -> DbResult<i64>;
}
