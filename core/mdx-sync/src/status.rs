//! Read-only diagnostics: row counts per table in both stores.

use crate::error::SyncResult;
use crate::store::RecordStore;
use chrono::{DateTime, Utc};
use mdx_types::SyncTable;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// How a table's row counts compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableState {
    Synced,
    LocalAhead,
    SupabaseAhead,
    Error,
}

/// Verdict over every table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Synced,
    OutOfSync,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStatus {
    pub table: String,
    pub local_count: u64,
    pub supabase_count: u64,
    /// `local_count - supabase_count`.
    pub difference: i64,
    pub status: TableState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub total_tables: usize,
    pub synced_tables: usize,
    pub error_tables: usize,
    pub total_local_records: u64,
    pub total_supabase_records: u64,
    pub total_difference: i64,
}

/// Result of [`check_status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub overall_status: OverallStatus,
    pub summary: StatusSummary,
    pub tables: Vec<TableStatus>,
    pub recommendations: Vec<String>,
    pub checked_at: DateTime<Utc>,
}

/// Counts every table in both stores and classifies the difference. Nothing
/// is written. A table whose count fails is reported with status `error`.
pub async fn check_status(
    local: &dyn RecordStore,
    remote: &dyn RecordStore,
    tables: &[SyncTable],
) -> StatusReport {
    let mut statuses = Vec::with_capacity(tables.len());
    for table in tables {
        let schema = table.schema();
        let counts: SyncResult<(u64, u64)> =
            tokio::try_join!(local.count(schema), remote.count(schema));
        let status = match counts {
            Ok((local_count, supabase_count)) => {
                let difference = local_count as i64 - supabase_count as i64;
                let status = match difference {
                    d if d > 0 => TableState::LocalAhead,
                    d if d < 0 => TableState::SupabaseAhead,
                    _ => TableState::Synced,
                };
                info!("{table}: local={local_count}, supabase={supabase_count}, {status:?}");
                TableStatus {
                    table: table.name().to_string(),
                    local_count,
                    supabase_count,
                    difference,
                    status,
                    error: None,
                }
            }
            Err(e) => {
                warn!("{table}: count failed: {e}");
                TableStatus {
                    table: table.name().to_string(),
                    local_count: 0,
                    supabase_count: 0,
                    difference: 0,
                    status: TableState::Error,
                    error: Some(e.to_string()),
                }
            }
        };
        statuses.push(status);
    }

    let summary = summarize(&statuses);
    StatusReport {
        overall_status: overall(&statuses),
        summary,
        recommendations: recommendations(&statuses),
        tables: statuses,
        checked_at: Utc::now(),
    }
}

fn count_state(statuses: &[TableStatus], state: TableState) -> usize {
    statuses.iter().filter(|s| s.status == state).count()
}

fn summarize(statuses: &[TableStatus]) -> StatusSummary {
    let total_local_records: u64 = statuses.iter().map(|s| s.local_count).sum();
    let total_supabase_records: u64 = statuses.iter().map(|s| s.supabase_count).sum();
    StatusSummary {
        total_tables: statuses.len(),
        synced_tables: count_state(statuses, TableState::Synced),
        error_tables: count_state(statuses, TableState::Error),
        total_local_records,
        total_supabase_records,
        total_difference: total_local_records as i64 - total_supabase_records as i64,
    }
}

fn overall(statuses: &[TableStatus]) -> OverallStatus {
    if count_state(statuses, TableState::Error) > 0 {
        OverallStatus::Error
    } else if statuses.iter().any(|s| s.status != TableState::Synced) {
        OverallStatus::OutOfSync
    } else {
        OverallStatus::Synced
    }
}

fn recommendations(statuses: &[TableStatus]) -> Vec<String> {
    let mut out = Vec::new();
    let local_ahead = count_state(statuses, TableState::LocalAhead);
    let supabase_ahead = count_state(statuses, TableState::SupabaseAhead);
    let errors = count_state(statuses, TableState::Error);

    if local_ahead > 0 {
        out.push(format!(
            "Sync {local_ahead} table(s) from the local database to Supabase"
        ));
    }
    if supabase_ahead > 0 {
        out.push(format!(
            "Sync {supabase_ahead} table(s) from Supabase to the local database"
        ));
    }
    if errors > 0 {
        out.push(format!("Fix errors in {errors} table(s) before syncing"));
    }
    if out.is_empty() {
        out.push("All databases are in sync".to_string());
    }
    out
}
