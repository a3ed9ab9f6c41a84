//! Record store abstraction.
//!
//! Both stores are reached through [`RecordStore`]. Records cross the trait
//! boundary in the store's own convention: remote records carry snake_case
//! columns and string dates, local records carry the registry's local names
//! and typed timestamps. Converting between the two is the transcoder's job.

use crate::error::SyncResult;
use async_trait::async_trait;
use mdx_types::{FieldSpec, Record, RecordKey, TableSchema};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the sync a store sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreSide {
    /// The locally provisioned database behind the ORM.
    Local,
    /// The hosted Supabase database.
    Remote,
}

impl StoreSide {
    /// Table name on this side.
    #[must_use]
    pub fn table_name(self, table: &TableSchema) -> &'static str {
        match self {
            Self::Local => table.local_name,
            Self::Remote => table.remote_name,
        }
    }

    /// Name of a field on this side.
    #[must_use]
    pub fn field_name(self, field: &FieldSpec) -> &'static str {
        match self {
            Self::Local => field.local,
            Self::Remote => field.remote,
        }
    }

    /// Primary key column on this side.
    #[must_use]
    pub fn primary_key(self, table: &TableSchema) -> &'static str {
        self.field_name(&table.primary_key)
    }
}

impl fmt::Display for StoreSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Remote => f.write_str("supabase"),
        }
    }
}

/// Query interface over one backing store, addressed by table schema and
/// primary key.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Which side this store is on; decides the record convention.
    fn side(&self) -> StoreSide;

    /// Human-readable store name for logs.
    fn name(&self) -> &'static str;

    /// Fetches every row of the table ordered by primary key ascending.
    async fn fetch_all(&self, table: &TableSchema) -> SyncResult<Vec<Record>>;

    /// Inserts a new row.
    async fn create(&self, table: &TableSchema, record: &Record) -> SyncResult<()>;

    /// Updates the row with the given key.
    async fn update(&self, table: &TableSchema, key: &RecordKey, record: &Record)
        -> SyncResult<()>;

    /// Inserts the row or updates it if the key exists.
    async fn upsert(&self, table: &TableSchema, record: &Record) -> SyncResult<()>;

    /// Counts the rows of the table.
    async fn count(&self, table: &TableSchema) -> SyncResult<u64>;
}
