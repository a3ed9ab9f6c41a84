//! Table synchronizer.
//!
//! Reconciles one table between the local store and Supabase. Both snapshots
//! are fetched concurrently, indexed by primary key and walked in key order.
//! A failing record is logged and counted; it never aborts the table.

use crate::compare::needs_update;
use crate::conflict::ConflictPolicy;
use crate::error::{SyncError, SyncResult};
use crate::store::{RecordStore, StoreSide};
use crate::transcode::transcode;
use mdx_types::{Record, RecordKey, SyncTable, TableSchema};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Which way records flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncDirection {
    /// Local → Supabase.
    ToSupabase,
    /// Supabase → local.
    FromSupabase,
    /// Both ways, resolving conflicts with the configured policy.
    Bidirectional,
}

impl SyncDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ToSupabase => "to-supabase",
            Self::FromSupabase => "from-supabase",
            Self::Bidirectional => "bidirectional",
        }
    }
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "to-supabase" => Ok(Self::ToSupabase),
            "from-supabase" => Ok(Self::FromSupabase),
            "bidirectional" => Ok(Self::Bidirectional),
            other => Err(format!(
                "invalid direction '{other}' (expected to-supabase, from-supabase or bidirectional)"
            )),
        }
    }
}

/// Outcome of one table pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSyncResult {
    pub table: String,
    /// Records written (created or updated).
    pub synced: u64,
    /// Records that failed to write or had no usable key.
    pub errors: u64,
    /// Records observed: the source count for a directional pass, the larger
    /// snapshot for a bidirectional one.
    pub total: u64,
    /// False when the table could not be read at all.
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub direction: SyncDirection,
}

impl TableSyncResult {
    /// A table whose pass was aborted before any record was processed.
    pub fn failed(table: SyncTable, direction: SyncDirection, err: &SyncError) -> Self {
        Self {
            table: table.name().to_string(),
            synced: 0,
            errors: 0,
            total: 0,
            success: false,
            error: Some(err.to_string()),
            direction,
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    synced: u64,
    errors: u64,
}

impl Tally {
    fn record(&mut self, outcome: SyncResult<()>, table: &TableSchema, key: &RecordKey, target: &dyn RecordStore) {
        match outcome {
            Ok(()) => self.synced += 1,
            Err(e) => {
                warn!(
                    "Failed to write {} #{key} to {}: {e}",
                    table.remote_name,
                    target.name()
                );
                self.errors += 1;
            }
        }
    }
}

/// Decision for a key present in both snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overwrite {
    Local,
    Remote,
}

/// Reconciles single tables between the two stores.
#[derive(Clone)]
pub struct TableSynchronizer {
    local: Arc<dyn RecordStore>,
    remote: Arc<dyn RecordStore>,
    policy: ConflictPolicy,
}

impl TableSynchronizer {
    /// Creates a synchronizer. Fails if the stores sit on the wrong sides.
    pub fn new(
        local: Arc<dyn RecordStore>,
        remote: Arc<dyn RecordStore>,
        policy: ConflictPolicy,
    ) -> SyncResult<Self> {
        if local.side() != StoreSide::Local || remote.side() != StoreSide::Remote {
            return Err(SyncError::Store(format!(
                "expected a local and a remote store, got {} and {}",
                local.side(),
                remote.side()
            )));
        }
        Ok(Self {
            local,
            remote,
            policy,
        })
    }

    pub fn local(&self) -> &Arc<dyn RecordStore> {
        &self.local
    }

    pub fn remote(&self) -> &Arc<dyn RecordStore> {
        &self.remote
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Syncs one table. Fetch failures become a failed result rather than
    /// an error so callers can carry on with the next table.
    pub async fn sync(&self, table: SyncTable, direction: SyncDirection) -> TableSyncResult {
        let outcome = match direction {
            SyncDirection::ToSupabase => {
                self.directional(table, self.local.as_ref(), self.remote.as_ref()).await
            }
            SyncDirection::FromSupabase => {
                self.directional(table, self.remote.as_ref(), self.local.as_ref()).await
            }
            SyncDirection::Bidirectional => self.bidirectional(table).await,
        };

        match outcome {
            Ok((tally, total)) => {
                info!(
                    "{table} ({direction}): {} synced, {} errors, {total} observed",
                    tally.synced, tally.errors
                );
                TableSyncResult {
                    table: table.name().to_string(),
                    synced: tally.synced,
                    errors: tally.errors,
                    total,
                    success: true,
                    error: None,
                    direction,
                }
            }
            Err(e) => {
                error!("{table} ({direction}) aborted: {e}");
                TableSyncResult::failed(table, direction, &e)
            }
        }
    }

    async fn snapshots(&self, schema: &TableSchema) -> SyncResult<(Vec<Record>, Vec<Record>)> {
        tokio::try_join!(self.local.fetch_all(schema), self.remote.fetch_all(schema))
    }

    /// One-way pass: create what the target lacks, update what differs.
    async fn directional(
        &self,
        table: SyncTable,
        source: &dyn RecordStore,
        target: &dyn RecordStore,
    ) -> SyncResult<(Tally, u64)> {
        let schema = table.schema();
        let (local, remote) = self.snapshots(schema).await?;
        let (source_rows, target_rows) = match source.side() {
            StoreSide::Local => (local, remote),
            StoreSide::Remote => (remote, local),
        };
        let total = source_rows.len() as u64;

        let mut tally = Tally::default();
        let source_map = index(schema, source.side(), source_rows, &mut tally);
        let target_map = index(schema, target.side(), target_rows, &mut Tally::default());
        let target_pk = target.side().primary_key(schema);

        for (key, record) in &source_map {
            let transcoded = transcode(schema, record, target.side());
            match target_map.get(key) {
                None => {
                    debug!("{table} #{key}: missing from {}, creating", target.name());
                    tally.record(target.create(schema, &transcoded).await, schema, key, target);
                }
                Some(existing) if needs_update(target_pk, &transcoded, existing) => {
                    debug!("{table} #{key}: differs, updating {}", target.name());
                    tally.record(target.update(schema, key, &transcoded).await, schema, key, target);
                }
                Some(_) => {}
            }
        }

        Ok((tally, total))
    }

    /// Supabase → local pass followed by local → Supabase over the original
    /// local snapshot. A conflicting key is written once, to the loser.
    async fn bidirectional(&self, table: SyncTable) -> SyncResult<(Tally, u64)> {
        let schema = table.schema();
        let (local_rows, remote_rows) = self.snapshots(schema).await?;
        let total = local_rows.len().max(remote_rows.len()) as u64;

        let mut tally = Tally::default();
        let local_map = index(schema, StoreSide::Local, local_rows, &mut tally);
        let remote_map = index(schema, StoreSide::Remote, remote_rows, &mut tally);

        let mut overwrites = BTreeMap::new();
        for (key, remote_record) in &remote_map {
            let Some(local_record) = local_map.get(key) else {
                continue;
            };
            let incoming = transcode(schema, remote_record, StoreSide::Local);
            if !needs_update(schema.primary_key.local, &incoming, local_record) {
                continue;
            }
            let target = match self.policy.resolve(schema, local_record, remote_record) {
                StoreSide::Local => Overwrite::Remote,
                StoreSide::Remote => Overwrite::Local,
            };
            debug!("{table} #{key}: conflict, overwriting {target:?} ({})", self.policy);
            overwrites.insert(key.clone(), target);
        }

        let local = self.local.as_ref();
        let remote = self.remote.as_ref();

        for (key, record) in &remote_map {
            let outcome = match (local_map.contains_key(key), overwrites.get(key)) {
                (false, _) => local.create(schema, &transcode(schema, record, StoreSide::Local)).await,
                (true, Some(Overwrite::Local)) => {
                    local.update(schema, key, &transcode(schema, record, StoreSide::Local)).await
                }
                _ => continue,
            };
            tally.record(outcome, schema, key, local);
        }

        for (key, record) in &local_map {
            let outcome = match (remote_map.contains_key(key), overwrites.get(key)) {
                (false, _) => remote.create(schema, &transcode(schema, record, StoreSide::Remote)).await,
                (true, Some(Overwrite::Remote)) => {
                    remote.update(schema, key, &transcode(schema, record, StoreSide::Remote)).await
                }
                _ => continue,
            };
            tally.record(outcome, schema, key, remote);
        }

        Ok((tally, total))
    }
}

/// Indexes a snapshot by primary key. Records without a usable key are
/// counted as errors and skipped.
fn index(
    schema: &TableSchema,
    side: StoreSide,
    rows: Vec<Record>,
    tally: &mut Tally,
) -> BTreeMap<RecordKey, Record> {
    let pk = side.primary_key(schema);
    let mut map = BTreeMap::new();
    for row in rows {
        match row.key(pk) {
            Some(key) => {
                map.insert(key, row);
            }
            None => {
                warn!("Skipping {} row without {pk} from {side}", schema.remote_name);
                tally.errors += 1;
            }
        }
    }
    map
}
