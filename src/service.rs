//! Browser service
//!
//! The request/response surface a frontend drives: connect, close, and the
//! four listing calls. Results come back as string-keyed row maps.

use crate::config::{ConnectionConfig, Settings, resolve_address};
use crate::db::{ColumnDescriptor, DataPage, DataRequest, Database, PostgresProvider, RowMap};
use crate::error::{DbError, DbResult, Result};
use tracing::info;

/// Holds at most one live database and the settings every call uses
pub struct BrowserService<D: Database = PostgresProvider> {
    db: Option<D>,
    settings: Settings,
}

impl<D: Database> BrowserService<D> {
    /// Create a disconnected service
    pub fn new(settings: Settings) -> Self {
        Self { db: None, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_connected(&self) -> bool {
        self.db.is_some()
    }

    /// Connect to a `postgres://` URL or a saved profile name.
    ///
    /// Any previous connection is closed first; on failure the service
    /// stays disconnected.
    pub async fn connect(&mut self, address: &str) -> Result<()> {
        let config = resolve_address(address)?;
        self.connect_with(&config).await?;
        Ok(())
    }

    pub async fn connect_with(&mut self, config: &ConnectionConfig) -> DbResult<()> {
        self.close();
        let db = D::connect(config, &self.settings).await?;
        self.db = Some(db);
        Ok(())
    }

    /// Release the connection; a no-op when disconnected
    pub fn close(&mut self) {
        if let Some(db) = self.db.take() {
            db.close();
            info!("disconnected");
        }
    }

    fn db(&self) -> DbResult<&D> {
        self.db.as_ref().ok_or(DbError::NotConnected)
    }

    pub async fn list_table(&self) -> DbResult<Vec<String>> {
        self.db()?.list_tables().await
    }

    /// Frontend-shaped data listing: an empty `direction` means unsorted
    pub async fn list_data(
        &self,
        table: &str,
        column: &str,
        direction: &str,
        offset: u64,
    ) -> DbResult<Vec<RowMap>> {
        let request =
            DataRequest::from_ui(table, column, direction, offset, self.settings.page_size)?;
        Ok(self.fetch_page(&request).await?.row_maps())
    }

    /// Typed data listing, keeping column order and cell kinds
    pub async fn fetch_page(&self, request: &DataRequest) -> DbResult<DataPage> {
        self.db()?.list_data(request).await
    }

    pub async fn list_structure(&self, table: &str) -> DbResult<Vec<RowMap>> {
        Ok(self
            .describe(table)
            .await?
            .iter()
            .map(ColumnDescriptor::to_row_map)
            .collect())
    }

    pub async fn describe(&self, table: &str) -> DbResult<Vec<ColumnDescriptor>> {
        self.db()?.list_structure(table).await
    }

    pub async fn list_count(&self, table: &str) -> DbResult<i64> {
        self.db()?.count_rows(table).await
    }
}

impl<D: Database> Drop for BrowserService<D> {
    fn drop(&mut self) {
        self.close();
    }
}
