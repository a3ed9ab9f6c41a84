//! Error types for the local store.

use thiserror::Error;

/// Result type for local store operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors that can occur in local store operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLite.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON column could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No row with the given primary key.
    #[error("record not found: {table}/{key}")]
    NotFound { table: String, key: String },

    /// The table does not exist locally.
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// The record carries nothing that maps onto the table.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A previous holder of the connection panicked.
    #[error("connection lock poisoned")]
    Poisoned,
}
