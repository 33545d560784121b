//! Database abstraction layer
//!
//! This module provides a trait-based abstraction over database operations,
//! allowing for easy testing with mocks.

#[cfg(test)]
pub(crate) mod mock;
pub mod pool;
pub mod postgres;
pub mod provider;
pub mod query;
pub mod types;

// Re-export main types
pub use postgres::PostgresProvider;
pub use provider::Database;
pub use query::TableRef;
pub use types::{
    CellValue, ColumnDescriptor, DataPage, DataRequest, Row, RowMap, Sort, SortDirection,
};
