//! Record store over the local SQLite database.

use crate::error::SyncResult;
use crate::store::{RecordStore, StoreSide};
use async_trait::async_trait;
use mdx_db::Database;
use mdx_types::{Record, RecordKey, TableSchema};

/// The local store. Blocking SQLite calls run on tokio's blocking pool.
#[derive(Clone)]
pub struct LocalStore {
    db: Database,
}

impl LocalStore {
    /// Wraps an open database handle.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// The underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    async fn blocking<T, F>(&self, f: F) -> SyncResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Database) -> mdx_db::DbResult<T> + Send + 'static,
    {
        let db = self.db.clone();
        Ok(tokio::task::spawn_blocking(move || f(db)).await??)
    }
}

#[async_trait]
impl RecordStore for LocalStore {
    fn side(&self) -> StoreSide {
        StoreSide::Local
    }

    fn name(&self) -> &'static str {
        "local"
    }

    async fn fetch_all(&self, table: &TableSchema) -> SyncResult<Vec<Record>> {
        let (name, pk) = (table.local_name, table.primary_key.local);
        self.blocking(move |db| db.find_all(name, pk)).await
    }

    async fn create(&self, table: &TableSchema, record: &Record) -> SyncResult<()> {
        let name = table.local_name;
        let record = record.clone();
        self.blocking(move |db| db.insert(name, &record)).await
    }

    async fn update(
        &self,
        table: &TableSchema,
        key: &RecordKey,
        record: &Record,
    ) -> SyncResult<()> {
        let (name, pk) = (table.local_name, table.primary_key.local);
        let (key, record) = (key.clone(), record.clone());
        self.blocking(move |db| db.update(name, pk, &key, &record)).await
    }

    async fn upsert(&self, table: &TableSchema, record: &Record) -> SyncResult<()> {
        let (name, pk) = (table.local_name, table.primary_key.local);
        let record = record.clone();
        self.blocking(move |db| db.upsert(name, pk, &record)).await
    }

    async fn count(&self, table: &TableSchema) -> SyncResult<u64> {
        let name = table.local_name;
        self.blocking(move |db| db.count(name)).await
    }
}
