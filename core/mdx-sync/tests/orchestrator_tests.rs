use mdx_sync::{
    ConflictPolicy, MemoryStore, OverallStatus, RecordStore, SyncConfig, SyncDirection,
    SyncOrchestrator, TableState,
};
use mdx_types::{FieldValue, Record, SyncTable, SYNC_LOG_SCHEMA};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn setup(tables: &[SyncTable]) -> (Arc<MemoryStore>, Arc<MemoryStore>, SyncOrchestrator) {
    let local = Arc::new(MemoryStore::local());
    let remote = Arc::new(MemoryStore::remote());
    let config = SyncConfig {
        tables: tables.to_vec(),
        ..Default::default()
    };
    let orchestrator = SyncOrchestrator::new(
        local.clone() as Arc<dyn RecordStore>,
        remote.clone() as Arc<dyn RecordStore>,
        config,
    )
    .unwrap();
    (local, remote, orchestrator)
}

fn seed_remote(store: &MemoryStore, table: SyncTable, ids: std::ops::RangeInclusive<i64>) {
    for id in ids {
        store
            .insert(table.schema(), Record::new().with("id", id).with("nome", format!("n{id}")))
            .unwrap();
    }
}

fn seed_local(store: &MemoryStore, table: SyncTable, ids: std::ops::RangeInclusive<i64>) {
    seed_remote(store, table, ids);
}

// ── Config ───────────────────────────────────────────────────────

#[test]
fn default_config_covers_every_table() {
    let config = SyncConfig::default();
    assert_eq!(config.tables, SyncTable::ALL.to_vec());
    assert_eq!(config.conflict_policy, ConflictPolicy::LatestUpdate);
}

#[test]
fn config_deserializes_with_defaults() {
    let config: SyncConfig =
        serde_json::from_str(r#"{"conflict_policy": "pass-order"}"#).unwrap();
    assert_eq!(config.conflict_policy, ConflictPolicy::PassOrder);
    assert_eq!(config.tables.len(), 17);

    let config: SyncConfig = serde_json::from_str(r#"{"tables": ["cursos", "eventos"]}"#).unwrap();
    assert_eq!(config.tables, vec![SyncTable::Cursos, SyncTable::Eventos]);
}

#[test]
fn conflict_policy_parses() {
    assert_eq!("pass-order".parse::<ConflictPolicy>(), Ok(ConflictPolicy::PassOrder));
    assert_eq!("latest-update".parse::<ConflictPolicy>(), Ok(ConflictPolicy::LatestUpdate));
    assert!("newest".parse::<ConflictPolicy>().is_err());
    assert_eq!(ConflictPolicy::PassOrder.to_string(), "pass-order");
}

#[test]
fn orchestrator_rejects_swapped_stores() {
    let result = SyncOrchestrator::new(
        Arc::new(MemoryStore::remote()),
        Arc::new(MemoryStore::local()),
        SyncConfig::default(),
    );
    assert!(result.is_err());
}

// ── Runs ─────────────────────────────────────────────────────────

#[tokio::test]
async fn run_visits_tables_in_order_and_sums_results() {
    let (local, remote, orchestrator) = setup(&[SyncTable::Escolas, SyncTable::Orientadores]);
    seed_remote(&remote, SyncTable::Escolas, 1..=3);
    seed_local(&local, SyncTable::Orientadores, 1..=2);

    let run = orchestrator.run(SyncDirection::Bidirectional).await;

    let tables: Vec<&str> = run.results.iter().map(|r| r.table.as_str()).collect();
    assert_eq!(tables, vec!["escolas", "orientadores"]);
    assert_eq!(run.summary.total_synced, 5);
    assert_eq!(run.summary.total_errors, 0);
    assert_eq!(run.summary.tables_processed, 2);
    assert_eq!(run.summary.successful_tables, 2);
    assert_eq!(run.summary.failed_tables, 0);
    assert_eq!(run.direction, SyncDirection::Bidirectional);
    assert!(run.finished_at >= run.started_at);
    assert_eq!(run.id.get_version_num(), 7);
}

#[tokio::test]
async fn failed_table_does_not_stop_the_run() {
    let (local, remote, orchestrator) = setup(&[SyncTable::Escolas, SyncTable::Orientadores]);
    seed_local(&local, SyncTable::Escolas, 1..=2);
    seed_local(&local, SyncTable::Orientadores, 1..=2);
    remote.fail_fetch(SyncTable::Escolas.schema());
    remote.fail_writes_for(SyncTable::Orientadores.schema(), 1i64);

    let run = orchestrator.run(SyncDirection::ToSupabase).await;

    assert!(!run.results[0].success);
    assert!(run.results[1].success);
    assert_eq!(run.summary.total_synced, 1);
    // One record error plus one failed table.
    assert_eq!(run.summary.total_errors, 2);
    assert_eq!(run.summary.failed_tables, 1);
}

#[tokio::test]
async fn sync_table_touches_only_that_table() {
    let (local, remote, orchestrator) = setup(&SyncTable::ALL);
    seed_local(&local, SyncTable::Escolas, 1..=2);
    seed_local(&local, SyncTable::Orientadores, 1..=2);

    let result = orchestrator
        .sync_table(SyncTable::Escolas, SyncDirection::ToSupabase)
        .await;

    assert_eq!(result.synced, 2);
    assert_eq!(remote.records(SyncTable::Escolas.schema()).len(), 2);
    assert!(remote.records(SyncTable::Orientadores.schema()).is_empty());
}

#[tokio::test]
async fn run_serializes_summary_in_camel_case() {
    let (_local, _remote, orchestrator) = setup(&[SyncTable::Cursos]);
    let run = orchestrator.run(SyncDirection::FromSupabase).await;

    let json = serde_json::to_value(&run).unwrap();
    assert_eq!(json["direction"], "from-supabase");
    assert_eq!(json["summary"]["tablesProcessed"], 1);
    assert!(json["summary"].get("totalSynced").is_some());
    assert!(json.get("startedAt").is_some());
}

// ── Daily run ────────────────────────────────────────────────────

#[tokio::test]
async fn daily_run_writes_a_log_row() {
    let (local, remote, orchestrator) = setup(&[SyncTable::Escolas]);
    seed_local(&local, SyncTable::Escolas, 1..=4);

    let run = orchestrator.run_daily().await;
    assert_eq!(run.direction, SyncDirection::Bidirectional);

    let logs = remote.records(&SYNC_LOG_SCHEMA);
    assert_eq!(logs.len(), 1);
    let log = &logs[0];
    assert_eq!(log.get("type"), Some(&FieldValue::from("daily_sync")));
    assert_eq!(log.get("total_synced"), Some(&FieldValue::Int(4)));
    assert_eq!(log.get("total_errors"), Some(&FieldValue::Int(0)));
    assert_eq!(log.get("tables_processed"), Some(&FieldValue::Int(1)));
    assert!(matches!(log.get("details"), Some(FieldValue::Json(_))));
    assert!(matches!(log.get("timestamp"), Some(FieldValue::Text(_))));
}

#[tokio::test]
async fn daily_run_survives_log_failure() {
    let (local, remote, orchestrator) = setup(&[SyncTable::Escolas]);
    seed_local(&local, SyncTable::Escolas, 1..=2);
    remote.fail_writes_for(&SYNC_LOG_SCHEMA, 1i64);

    let run = orchestrator.run_daily().await;

    assert_eq!(run.summary.total_synced, 2);
    assert!(remote.records(&SYNC_LOG_SCHEMA).is_empty());
}

// ── Status ───────────────────────────────────────────────────────

#[tokio::test]
async fn status_classifies_each_table() {
    let (local, remote, orchestrator) =
        setup(&[SyncTable::Escolas, SyncTable::Cursos, SyncTable::Eventos]);
    seed_local(&local, SyncTable::Escolas, 1..=3);
    seed_remote(&remote, SyncTable::Escolas, 1..=1);
    seed_remote(&remote, SyncTable::Cursos, 1..=2);
    seed_local(&local, SyncTable::Eventos, 1..=2);
    seed_remote(&remote, SyncTable::Eventos, 1..=2);

    let report = orchestrator.check_status().await;

    let states: Vec<(String, TableState, i64)> = report
        .tables
        .iter()
        .map(|t| (t.table.clone(), t.status, t.difference))
        .collect();
    assert_eq!(
        states,
        vec![
            ("escolas".to_string(), TableState::LocalAhead, 2),
            ("cursos".to_string(), TableState::SupabaseAhead, -2),
            ("eventos".to_string(), TableState::Synced, 0),
        ]
    );
    assert_eq!(report.overall_status, OverallStatus::OutOfSync);
    assert_eq!(report.summary.synced_tables, 1);
    assert_eq!(report.summary.total_local_records, 5);
    assert_eq!(report.summary.total_supabase_records, 5);
    assert_eq!(
        report.recommendations,
        vec![
            "Sync 1 table(s) from the local database to Supabase".to_string(),
            "Sync 1 table(s) from Supabase to the local database".to_string(),
        ]
    );
}

#[tokio::test]
async fn status_reports_count_errors() {
    let (_local, remote, orchestrator) = setup(&[SyncTable::Escolas, SyncTable::Cursos]);
    remote.fail_fetch(SyncTable::Cursos.schema());

    let report = orchestrator.check_status().await;

    assert_eq!(report.tables[1].status, TableState::Error);
    assert!(report.tables[1].error.is_some());
    assert_eq!(report.overall_status, OverallStatus::Error);
    assert_eq!(report.summary.error_tables, 1);
    assert!(report.recommendations[0].starts_with("Fix errors in 1 table(s)"));
}

#[tokio::test]
async fn status_of_matching_stores_is_synced() {
    let (_local, remote, orchestrator) = setup(&[SyncTable::Escolas]);
    let report = orchestrator.check_status().await;
    assert_eq!(report.overall_status, OverallStatus::Synced);
    assert_eq!(report.recommendations, vec!["All databases are in sync".to_string()]);
    assert_eq!(remote.writes(), 0);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["overallStatus"], "synced");
    assert_eq!(json["tables"][0]["supabaseCount"], 0);
    assert_eq!(json["tables"][0]["status"], "synced");
}
