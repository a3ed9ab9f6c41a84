//! Conflict resolution for keys present in both stores.

use crate::store::StoreSide;
use mdx_types::{Record, TableSchema};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decides which side wins when a record differs between the stores.
///
/// The losing side is overwritten; the winning side is left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// The second-processed store (local) always wins.
    PassOrder,
    /// The record with the later `updated_at` wins. Missing or equal
    /// timestamps fall back to [`ConflictPolicy::PassOrder`].
    #[default]
    LatestUpdate,
}

impl ConflictPolicy {
    /// Picks the winning side for a conflicting pair of records, each in its
    /// own store's convention.
    #[must_use]
    pub fn resolve(self, table: &TableSchema, local: &Record, remote: &Record) -> StoreSide {
        match self {
            Self::PassOrder => StoreSide::Local,
            Self::LatestUpdate => {
                let Some(spec) = table.updated_at() else {
                    return StoreSide::Local;
                };
                let local_ts = local.get(spec.local).and_then(|v| v.as_instant());
                let remote_ts = remote.get(spec.remote).and_then(|v| v.as_instant());
                match (local_ts, remote_ts) {
                    (Some(l), Some(r)) if r > l => StoreSide::Remote,
                    _ => StoreSide::Local,
                }
            }
        }
    }

    /// Name used in configuration and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PassOrder => "pass-order",
            Self::LatestUpdate => "latest-update",
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pass-order" => Ok(Self::PassOrder),
            "latest-update" => Ok(Self::LatestUpdate),
            other => Err(format!(
                "unknown conflict policy '{other}' (expected pass-order or latest-update)"
            )),
        }
    }
}
