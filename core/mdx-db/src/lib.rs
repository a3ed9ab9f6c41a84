//! SQLite connection management for the MDX25 local store.
//!
//! The local store holds the same tables as the remote one, named and typed
//! after the schema registry in `mdx-types`: ORM-style field names and typed
//! timestamps. This crate is synchronous; async callers hop onto a blocking
//! thread before touching it.
//!
//! # Architecture
//!
//! - [`Database`] owns a single connection behind a mutex and is cheap to clone
//! - Rows are read and written as [`mdx_types::Record`]s, decoded by each
//!   column's declared type
//! - [`Database::ensure_schema`] bootstraps missing tables from the registry

mod database;
mod error;
mod rows;

pub use database::Database;
pub use error::{DbError, DbResult};
