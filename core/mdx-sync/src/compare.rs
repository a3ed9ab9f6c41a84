//! Change comparator.
//!
//! Both records must already be in the destination's convention; run the
//! source through [`crate::transcode`] first.

use mdx_types::{FieldValue, Record, TableSchema};

/// Names of the fields whose values differ between `source` and
/// `destination`.
///
/// Only fields present on both records are compared. The primary key and
/// audit timestamps are skipped.
#[must_use]
pub fn changed_fields(primary_key: &str, source: &Record, destination: &Record) -> Vec<String> {
    source
        .iter()
        .filter(|(name, _)| name.as_str() != primary_key && !TableSchema::is_audit_field(name))
        .filter_map(|(name, value)| {
            let other = destination.get(name)?;
            (!equivalent(value, other)).then(|| name.clone())
        })
        .collect()
}

/// Returns true if writing `source` over `destination` would change anything.
#[must_use]
pub fn needs_update(primary_key: &str, source: &Record, destination: &Record) -> bool {
    !changed_fields(primary_key, source, destination).is_empty()
}

/// Semantic equality of two field values across store encodings.
#[must_use]
pub fn equivalent(a: &FieldValue, b: &FieldValue) -> bool {
    use FieldValue::{Bool, Float, Int, Json, Null, Text, Timestamp};

    if a == b {
        return true;
    }
    match (a, b) {
        (Null, _) | (_, Null) => false,
        (Int(i), Float(f)) | (Float(f), Int(i)) => (*i as f64) == *f,
        (Bool(flag), Int(i)) | (Int(i), Bool(flag)) => matches!((*flag, *i), (true, 1) | (false, 0)),
        (Json(value), Text(text)) | (Text(text), Json(value)) => {
            serde_json::from_str::<serde_json::Value>(text).is_ok_and(|parsed| &parsed == value)
        }
        (Timestamp(_), _) | (_, Timestamp(_)) | (Text(_), Text(_)) => {
            match (a.as_instant(), b.as_instant()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        _ => false,
    }
}
