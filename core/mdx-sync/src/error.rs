//! Error types for the sync layer.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network error talking to the remote store.
    #[error("network error: {0}")]
    Network(String),

    /// The remote store answered with a non-success status.
    #[error("remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// Local store error.
    #[error("storage error: {0}")]
    Storage(#[from] mdx_db::DbError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Schema registry error (unknown table, invalid mapping).
    #[error("schema error: {0}")]
    Schema(#[from] mdx_types::TypesError),

    /// No row with the given key exists.
    #[error("no row with key {key} in {table}")]
    NotFound { table: String, key: String },

    /// A record lacks a usable primary key.
    #[error("record in {table} has no primary key {field}")]
    MissingKey { table: String, field: String },

    /// Injected or otherwise unclassified store failure.
    #[error("store error: {0}")]
    Store(String),

    /// A blocking task was cancelled or panicked.
    #[error("background task failed: {0}")]
    Task(String),
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<tokio::task::JoinError> for SyncError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}
