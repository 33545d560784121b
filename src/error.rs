//! Error types for sherlock
//!
//! This module defines the error hierarchy used throughout the application.
//! We use `thiserror` for library-style errors with clear error chains.

use std::io;

/// Main error type for the sherlock application
#[derive(Debug, thiserror::Error)]
pub enum SherlockError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Command parsing errors
    #[error("Command error: {0}")]
    Command(#[from] CommandError),
}

/// Database operation errors
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Failed to establish connection or the initial ping failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// Not connected to a database
    #[error("Not connected to database")]
    NotConnected,

    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,

    /// Type conversion error
    #[error("Type conversion error: {0}")]
    TypeConversion(String),

    /// Table is not present in pg_catalog
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Column is not part of the table
    #[error("Unknown column '{column}' in table {table}")]
    UnknownColumn { table: String, column: String },

    /// Caller passed a value the query builder refuses to interpolate
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Configuration loading/parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Home directory not found
    #[error("Could not determine home directory")]
    NoHomeDir,

    /// Config file could not be read
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Connection profile not found
    #[error("Connection profile '{0}' not found")]
    ProfileNotFound(String),
}

/// Command parsing errors
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Unknown command
    #[error("Unknown command: {0}")]
    Unknown(String),

    /// Missing required argument
    #[error("Missing required argument for command '{0}'")]
    MissingArgument(&'static str),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Command needs a current table
    #[error("No table selected, pick one with /use <table>")]
    NoTableSelected,
}

/// Specialized Result type for sherlock operations
pub type Result<T> = std::result::Result<T, SherlockError>;

/// Specialized Result type for database operations
pub type DbResult<T> = std::result::Result<T, DbError>;

/// Specialized Result type for config operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized Result type for command operations
pub type CommandResult<T> = std::result::Result<T, CommandError>;

impl From<tokio_postgres::Error> for DbError {
    fn from(e: tokio_postgres::Error) -> Self {
        // Surface the server message (e.g. "relation does not exist") when present
        match e.as_db_error() {
            Some(db) => DbError::QueryFailed(db.message().to_string()),
            None => DbError::QueryFailed(e.to_string()),
        }
    }
}
