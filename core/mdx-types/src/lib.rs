//! Core type definitions for the MDX25 database sync.
//!
//! This crate defines the store-agnostic types shared by every layer:
//! - Records as ordered field maps with typed scalar, date and JSON values
//! - Primary keys that order the same way in both stores
//! - The explicit per-table schema registry that pairs each remote
//!   (snake_case) column with its local (ORM) field
//! - The generic naming heuristics used for keys the registry does not list
//!
//! Nothing here performs I/O. Store adapters live in `mdx-db` and `mdx-sync`.

pub mod naming;
mod record;
pub mod schema;
mod value;

pub use record::{Record, RecordKey};
pub use schema::{
    validate_schemas, FieldKind, FieldSpec, SyncTable, TableSchema, SYNC_LOG_SCHEMA,
};
pub use value::{format_timestamp, parse_date_like, FieldValue};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, TypesError>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("invalid schema for table {table}: {reason}")]
    InvalidSchema { table: String, reason: String },

    #[error("expected a JSON object, got {0}")]
    NotAnObject(String),
}
