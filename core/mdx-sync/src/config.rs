//! Sync configuration.

use crate::conflict::ConflictPolicy;
use mdx_types::SyncTable;
use serde::{Deserialize, Serialize};

/// Configuration for a [`crate::SyncOrchestrator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Tables visited by a run, in order.
    pub tables: Vec<SyncTable>,
    /// How bidirectional conflicts are resolved.
    pub conflict_policy: ConflictPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tables: SyncTable::ALL.to_vec(),
            conflict_policy: ConflictPolicy::default(),
        }
    }
}
