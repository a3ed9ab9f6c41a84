//! In-process record store.
//!
//! Holds tables in memory, counts writes and can be told to fail specific
//! keys or whole tables. Used for dry runs and tests. Rows created without
//! a primary key get the next integer key on serial tables and a fresh
//! UUID everywhere else, as the database defaults would.

use crate::error::{SyncError, SyncResult};
use crate::store::{RecordStore, StoreSide};
use async_trait::async_trait;
use mdx_types::{FieldKind, Record, RecordKey, TableSchema};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

type Table = BTreeMap<RecordKey, Record>;

/// A store that keeps every table in memory.
pub struct MemoryStore {
    side: StoreSide,
    tables: Mutex<HashMap<String, Table>>,
    failing_keys: Mutex<HashSet<(String, RecordKey)>>,
    failing_tables: Mutex<HashSet<String>>,
    writes: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn next_key(kind: FieldKind, rows: &Table) -> RecordKey {
    if kind != FieldKind::Integer {
        return RecordKey::Text(Uuid::now_v7().to_string());
    }
    let last = rows
        .keys()
        .filter_map(|k| match k {
            RecordKey::Int(i) => Some(*i),
            RecordKey::Text(_) => None,
        })
        .max()
        .unwrap_or(0);
    RecordKey::Int(last + 1)
}

impl MemoryStore {
    /// Creates an empty store on the given side.
    pub fn new(side: StoreSide) -> Self {
        Self {
            side,
            tables: Mutex::new(HashMap::new()),
            failing_keys: Mutex::new(HashSet::new()),
            failing_tables: Mutex::new(HashSet::new()),
            writes: AtomicU64::new(0),
        }
    }

    /// An empty store standing in for the local database.
    pub fn local() -> Self {
        Self::new(StoreSide::Local)
    }

    /// An empty store standing in for Supabase.
    pub fn remote() -> Self {
        Self::new(StoreSide::Remote)
    }

    /// Seeds a record without counting it as a write.
    pub fn insert(&self, table: &TableSchema, record: Record) -> SyncResult<()> {
        let key = self.key_of(table, &record)?;
        lock(&self.tables)
            .entry(self.side.table_name(table).to_string())
            .or_default()
            .insert(key, record);
        Ok(())
    }

    /// Returns the record stored under `key`.
    pub fn get(&self, table: &TableSchema, key: &RecordKey) -> Option<Record> {
        lock(&self.tables)
            .get(self.side.table_name(table))
            .and_then(|rows| rows.get(key).cloned())
    }

    /// Every record of a table, ordered by key.
    pub fn records(&self, table: &TableSchema) -> Vec<Record> {
        lock(&self.tables)
            .get(self.side.table_name(table))
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of successful writes (create, update, upsert) so far.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes every write of `key` in `table` fail.
    pub fn fail_writes_for(&self, table: &TableSchema, key: impl Into<RecordKey>) {
        lock(&self.failing_keys).insert((self.side.table_name(table).to_string(), key.into()));
    }

    /// Makes fetching and counting `table` fail.
    pub fn fail_fetch(&self, table: &TableSchema) {
        lock(&self.failing_tables).insert(self.side.table_name(table).to_string());
    }

    fn key_of(&self, table: &TableSchema, record: &Record) -> SyncResult<RecordKey> {
        let field = self.side.primary_key(table);
        record.key(field).ok_or_else(|| SyncError::MissingKey {
            table: self.side.table_name(table).to_string(),
            field: field.to_string(),
        })
    }

    fn check_fetch(&self, table: &TableSchema) -> SyncResult<()> {
        let name = self.side.table_name(table);
        if lock(&self.failing_tables).contains(name) {
            return Err(SyncError::Store(format!("fetch of {name} failed")));
        }
        Ok(())
    }

    fn check_write(&self, table: &TableSchema, key: &RecordKey) -> SyncResult<()> {
        let name = self.side.table_name(table).to_string();
        if lock(&self.failing_keys).contains(&(name.clone(), key.clone())) {
            return Err(SyncError::Store(format!("write of {key} in {name} failed")));
        }
        Ok(())
    }

    fn write(
        &self,
        table: &TableSchema,
        apply: impl FnOnce(&mut Table) -> SyncResult<()>,
    ) -> SyncResult<()> {
        let mut tables = lock(&self.tables);
        apply(tables.entry(self.side.table_name(table).to_string()).or_default())?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn side(&self) -> StoreSide {
        self.side
    }

    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch_all(&self, table: &TableSchema) -> SyncResult<Vec<Record>> {
        self.check_fetch(table)?;
        Ok(self.records(table))
    }

    async fn create(&self, table: &TableSchema, record: &Record) -> SyncResult<()> {
        let pk = self.side.primary_key(table);
        self.write(table, |rows| {
            let key = record
                .key(pk)
                .unwrap_or_else(|| next_key(table.primary_key.kind, rows));
            self.check_write(table, &key)?;
            if rows.contains_key(&key) {
                return Err(SyncError::Store(format!(
                    "duplicate key {key} in {}",
                    self.side.table_name(table)
                )));
            }
            let mut record = record.clone();
            record.insert(pk, key.to_value());
            rows.insert(key, record);
            Ok(())
        })
    }

    async fn update(
        &self,
        table: &TableSchema,
        key: &RecordKey,
        record: &Record,
    ) -> SyncResult<()> {
        self.check_write(table, key)?;
        self.write(table, |rows| {
            let existing = rows.get_mut(key).ok_or_else(|| SyncError::NotFound {
                table: table.remote_name.to_string(),
                key: key.to_string(),
            })?;
            for (name, value) in record.iter() {
                existing.insert(name.clone(), value.clone());
            }
            Ok(())
        })
    }

    async fn upsert(&self, table: &TableSchema, record: &Record) -> SyncResult<()> {
        let key = self.key_of(table, record)?;
        self.check_write(table, &key)?;
        self.write(table, |rows| {
            let existing = rows.entry(key).or_default();
            for (name, value) in record.iter() {
                existing.insert(name.clone(), value.clone());
            }
            Ok(())
        })
    }

    async fn count(&self, table: &TableSchema) -> SyncResult<u64> {
        self.check_fetch(table)?;
        Ok(self.records(table).len() as u64)
    }
}
