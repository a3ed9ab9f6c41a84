//! Conversion between SQLite values and record fields.
//!
//! SQLite stores timestamps, booleans and JSON as plain text or integers, so
//! decoding relies on each column's declared type.

use mdx_types::{format_timestamp, parse_date_like, FieldKind, FieldValue};
use rusqlite::types::{Value, ValueRef};

/// How a column's stored value should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnKind {
    Plain,
    Temporal,
    Boolean,
    Json,
}

impl ColumnKind {
    /// Classifies a declared column type (`DATE`, `TIMESTAMP`, `BOOLEAN`, `JSON`, ...).
    pub(crate) fn from_decl(decl: Option<&str>) -> Self {
        let Some(decl) = decl else {
            return Self::Plain;
        };
        let decl = decl.to_ascii_uppercase();
        if decl.contains("BOOL") {
            Self::Boolean
        } else if decl.contains("DATE") || decl.contains("TIME") {
            Self::Temporal
        } else if decl.contains("JSON") {
            Self::Json
        } else {
            Self::Plain
        }
    }
}

/// Decodes a stored value. Values that do not fit the declared type are
/// passed through as-is rather than failing the whole row.
pub(crate) fn decode(value: ValueRef<'_>, kind: ColumnKind) -> FieldValue {
    match (value, kind) {
        (ValueRef::Null, _) => FieldValue::Null,
        (ValueRef::Integer(i), ColumnKind::Boolean) => FieldValue::Bool(i != 0),
        (ValueRef::Integer(i), _) => FieldValue::Int(i),
        (ValueRef::Real(f), _) => FieldValue::Float(f),
        (ValueRef::Text(bytes), kind) => {
            let text = String::from_utf8_lossy(bytes).into_owned();
            match kind {
                ColumnKind::Temporal => match parse_date_like(&text) {
                    Some(ts) => FieldValue::Timestamp(ts),
                    None => FieldValue::Text(text),
                },
                ColumnKind::Json => match serde_json::from_str::<serde_json::Value>(&text) {
                    Ok(v) => FieldValue::from_json(v),
                    Err(_) => FieldValue::Text(text),
                },
                ColumnKind::Boolean => match text.as_str() {
                    "true" | "t" | "1" => FieldValue::Bool(true),
                    "false" | "f" | "0" => FieldValue::Bool(false),
                    _ => FieldValue::Text(text),
                },
                ColumnKind::Plain => FieldValue::Text(text),
            }
        }
        (ValueRef::Blob(bytes), _) => FieldValue::Text(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Encodes a field for storage.
pub(crate) fn encode(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(b) => Value::Integer(i64::from(*b)),
        FieldValue::Int(i) => Value::Integer(*i),
        FieldValue::Float(f) => Value::Real(*f),
        FieldValue::Text(s) => Value::Text(s.clone()),
        FieldValue::Timestamp(ts) => Value::Text(format_timestamp(ts)),
        FieldValue::Json(v) => Value::Text(v.to_string()),
    }
}

/// Declared SQLite type for a registry field kind.
pub(crate) fn sql_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Integer => "INTEGER",
        FieldKind::Float => "REAL",
        FieldKind::Text | FieldKind::Uuid => "TEXT",
        FieldKind::Boolean => "BOOLEAN",
        FieldKind::Date => "DATE",
        FieldKind::Timestamp => "TIMESTAMP",
        FieldKind::Json => "JSON",
    }
}

/// Quotes an identifier for use in SQL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
