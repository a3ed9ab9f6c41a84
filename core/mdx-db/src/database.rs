//! Connection handle and row operations.

use crate::error::{DbError, DbResult};
use crate::rows::{decode, encode, quote_ident, sql_type, ColumnKind};
use mdx_types::{FieldValue, Record, RecordKey, TableSchema};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Handle to the local SQLite database.
///
/// Cloning shares the underlying connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        info!("Opened local database at {}", path.display());
        Ok(Self::from_connection(conn))
    }

    /// Opens an in-memory database (for testing and dry runs).
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    /// Creates any missing table from its registry schema. Existing tables
    /// are left untouched.
    pub fn ensure_schema(&self, schemas: &[&TableSchema]) -> DbResult<()> {
        let conn = self.conn()?;
        for schema in schemas {
            let columns: Vec<String> = schema
                .fields
                .iter()
                .map(|f| {
                    let column = format!("{} {}", quote_ident(f.local), sql_type(f.kind));
                    if f == &schema.primary_key {
                        // Only INTEGER keys alias the rowid.
                        format!("{column} PRIMARY KEY")
                    } else {
                        column
                    }
                })
                .collect();
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {} ({});",
                quote_ident(schema.local_name),
                columns.join(", ")
            ))?;
            debug!("Ensured local table {}", schema.local_name);
        }
        Ok(())
    }

    /// Returns the column names of a table.
    pub fn columns(&self, table: &str) -> DbResult<Vec<String>> {
        let conn = self.conn()?;
        table_columns(&conn, table)
    }

    /// Reads every row of a table ordered by primary key ascending.
    pub fn find_all(&self, table: &str, primary_key: &str) -> DbResult<Vec<Record>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT * FROM {} ORDER BY {} ASC",
            quote_ident(table),
            quote_ident(primary_key)
        );
        query_records(&conn, &sql, Vec::new())
    }

    /// Reads one row by primary key.
    pub fn find(&self, table: &str, primary_key: &str, key: &RecordKey) -> DbResult<Option<Record>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?1",
            quote_ident(table),
            quote_ident(primary_key)
        );
        Ok(query_records(&conn, &sql, vec![encode(&key.to_value())])?
            .into_iter()
            .next())
    }

    /// Inserts a new row.
    pub fn insert(&self, table: &str, record: &Record) -> DbResult<()> {
        let conn = self.conn()?;
        let fields = writable_fields(&conn, table, record)?;
        let (names, values) = split(fields);
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
        conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote_ident(table),
                names.join(", "),
                placeholders.join(", ")
            ),
            params_from_iter(values.iter()),
        )?;
        Ok(())
    }

    /// Updates the row with the given primary key. Fails with
    /// [`DbError::NotFound`] if no such row exists.
    pub fn update(
        &self,
        table: &str,
        primary_key: &str,
        key: &RecordKey,
        record: &Record,
    ) -> DbResult<()> {
        let conn = self.conn()?;
        let fields: Vec<(&String, &FieldValue)> = writable_fields(&conn, table, record)?
            .into_iter()
            .filter(|(name, _)| name.as_str() != primary_key)
            .collect();

        let not_found = || DbError::NotFound {
            table: table.to_string(),
            key: key.to_string(),
        };

        if fields.is_empty() {
            let exists: i64 = conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM {} WHERE {} = ?1",
                    quote_ident(table),
                    quote_ident(primary_key)
                ),
                [encode(&key.to_value())],
                |row| row.get(0),
            )?;
            return if exists > 0 { Ok(()) } else { Err(not_found()) };
        }

        let (names, mut values) = split(fields);
        let assignments: Vec<String> = names
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{name} = ?{}", i + 1))
            .collect();
        values.push(encode(&key.to_value()));

        let changed = conn.execute(
            &format!(
                "UPDATE {} SET {} WHERE {} = ?{}",
                quote_ident(table),
                assignments.join(", "),
                quote_ident(primary_key),
                values.len()
            ),
            params_from_iter(values.iter()),
        )?;

        if changed == 0 {
            return Err(not_found());
        }
        Ok(())
    }

    /// Inserts the row, or updates it if the primary key already exists.
    pub fn upsert(&self, table: &str, primary_key: &str, record: &Record) -> DbResult<()> {
        if !record.contains(primary_key) {
            return Err(DbError::InvalidData(format!(
                "upsert into {table} without primary key {primary_key}"
            )));
        }

        let conn = self.conn()?;
        let fields = writable_fields(&conn, table, record)?;
        let (names, values) = split(fields);
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
        let quoted_pk = quote_ident(primary_key);
        let updates: Vec<String> = names
            .iter()
            .filter(|name| **name != quoted_pk)
            .map(|name| format!("{name} = excluded.{name}"))
            .collect();
        let on_conflict = if updates.is_empty() {
            "DO NOTHING".to_string()
        } else {
            format!("DO UPDATE SET {}", updates.join(", "))
        };

        conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({quoted_pk}) {on_conflict}",
                quote_ident(table),
                names.join(", "),
                placeholders.join(", ")
            ),
            params_from_iter(values.iter()),
        )?;
        Ok(())
    }

    /// Counts the rows of a table.
    pub fn count(&self, table: &str) -> DbResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

fn table_columns(conn: &Connection, table: &str) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    if columns.is_empty() {
        return Err(DbError::UnknownTable(table.to_string()));
    }
    Ok(columns)
}

fn query_records(conn: &Connection, sql: &str, params: Vec<Value>) -> DbResult<Vec<Record>> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<(String, ColumnKind)> = stmt
        .columns()
        .iter()
        .map(|c| (c.name().to_string(), ColumnKind::from_decl(c.decl_type())))
        .collect();

    let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
        let mut record = Record::new();
        for (i, (name, kind)) in columns.iter().enumerate() {
            record.insert(name.clone(), decode(row.get_ref(i)?, *kind));
        }
        Ok(record)
    })?;

    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Fields of `record` that exist as columns of `table`. Unknown fields are
/// dropped so rows written by a newer remote schema still land.
fn writable_fields<'r>(
    conn: &Connection,
    table: &str,
    record: &'r Record,
) -> DbResult<Vec<(&'r String, &'r FieldValue)>> {
    let columns: HashSet<String> = table_columns(conn, table)?.into_iter().collect();
    let (known, dropped): (Vec<_>, Vec<_>) =
        record.iter().partition(|(name, _)| columns.contains(name.as_str()));

    if !dropped.is_empty() {
        let names: Vec<&str> = dropped.iter().map(|(n, _)| n.as_str()).collect();
        warn!("Dropping fields missing from local table {table}: {}", names.join(", "));
    }
    if known.is_empty() {
        return Err(DbError::InvalidData(format!(
            "record has no columns of local table {table}"
        )));
    }
    Ok(known)
}

fn split(fields: Vec<(&String, &FieldValue)>) -> (Vec<String>, Vec<Value>) {
    fields
        .into_iter()
        .map(|(name, value)| (quote_ident(name), encode(value)))
        .unzip()
}
