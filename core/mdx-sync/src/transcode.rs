//! Field transcoder.
//!
//! Rewrites a record from one store's convention into the other's. Names go
//! through the table schema first and fall back to the case heuristics;
//! values are adjusted so the destination can store them as-is.

use crate::store::StoreSide;
use mdx_types::{format_timestamp, parse_date_like, FieldValue, Record, TableSchema};

/// Converts a record into the convention of the `toward` store.
#[must_use]
pub fn transcode(table: &TableSchema, record: &Record, toward: StoreSide) -> Record {
    match toward {
        StoreSide::Local => to_local(table, record),
        StoreSide::Remote => to_remote(table, record),
    }
}

/// Remote → local: local field names, date-like strings upgraded to
/// timestamps where the field is temporal (or unmapped and looks like a date).
#[must_use]
pub fn to_local(table: &TableSchema, record: &Record) -> Record {
    record
        .iter()
        .map(|(name, value)| {
            let spec = table.field_by_remote(name);
            let upgrade = match spec {
                Some(spec) => spec.kind.is_temporal(),
                None => true,
            };
            let value = match value {
                FieldValue::Text(text) if upgrade => parse_date_like(text)
                    .map(FieldValue::Timestamp)
                    .unwrap_or_else(|| value.clone()),
                _ => value.clone(),
            };
            (table.local_name_for(name).into_owned(), value)
        })
        .collect()
}

/// Local → remote: remote column names, timestamps downgraded to ISO-8601
/// strings with millisecond precision.
#[must_use]
pub fn to_remote(table: &TableSchema, record: &Record) -> Record {
    record
        .iter()
        .map(|(name, value)| {
            let value = match value {
                FieldValue::Timestamp(ts) => FieldValue::Text(format_timestamp(ts)),
                other => other.clone(),
            };
            (table.remote_name_for(name).into_owned(), value)
        })
        .collect()
}
