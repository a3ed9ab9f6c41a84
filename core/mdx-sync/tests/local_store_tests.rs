use chrono::{TimeZone, Utc};
use mdx_db::Database;
use mdx_sync::{
    ConflictPolicy, LocalStore, MemoryStore, RecordStore, StoreSide, SyncDirection, SyncError,
    TableSynchronizer,
};
use mdx_types::{FieldValue, Record, RecordKey, SyncTable};
use std::sync::Arc;

fn id(n: u32) -> String {
    format!("0190a1b2-0000-7000-8000-{n:012}")
}

fn local_store() -> LocalStore {
    let db = Database::open_in_memory().unwrap();
    let schemas: Vec<_> = SyncTable::ALL.iter().map(|t| t.schema()).collect();
    db.ensure_schema(&schemas).unwrap();
    LocalStore::new(db)
}

// ── Store operations ─────────────────────────────────────────────

#[tokio::test]
async fn local_store_reports_its_side() {
    let store = local_store();
    assert_eq!(store.side(), StoreSide::Local);
    assert_eq!(store.name(), "local");
}

#[tokio::test]
async fn create_fetch_and_count() {
    let store = local_store();
    let schema = SyncTable::Cursos.schema();
    for n in [3, 1, 2] {
        store
            .create(schema, &Record::new().with("id", id(n)).with("nomeCurso", "c"))
            .await
            .unwrap();
    }

    let rows = store.fetch_all(schema).await.unwrap();
    let keys: Vec<_> = rows.iter().filter_map(|r| r.key("id")).collect();
    assert_eq!(
        keys,
        vec![
            RecordKey::from(id(1)),
            RecordKey::from(id(2)),
            RecordKey::from(id(3)),
        ]
    );
    assert_eq!(store.count(schema).await.unwrap(), 3);
}

#[tokio::test]
async fn update_of_missing_row_fails() {
    let store = local_store();
    let result = store
        .update(
            SyncTable::Cursos.schema(),
            &RecordKey::from(id(42)),
            &Record::new().with("nomeCurso", "x"),
        )
        .await;
    assert!(matches!(result, Err(SyncError::Storage(_))));
}

#[tokio::test]
async fn upsert_merges_into_existing_row() {
    let store = local_store();
    let schema = SyncTable::Cursos.schema();
    store
        .create(
            schema,
            &Record::new()
                .with("id", id(1))
                .with("nomeCurso", "a")
                .with("cargaHoraria", 20i64),
        )
        .await
        .unwrap();
    store
        .upsert(schema, &Record::new().with("id", id(1)).with("nomeCurso", "b"))
        .await
        .unwrap();

    let rows = store.fetch_all(schema).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("nomeCurso"), Some(&FieldValue::from("b")));
    assert_eq!(rows[0].get("cargaHoraria"), Some(&FieldValue::Int(20)));
}

#[tokio::test]
async fn missing_local_table_is_a_fetch_error() {
    let store = LocalStore::new(Database::open_in_memory().unwrap());
    assert!(store.fetch_all(SyncTable::Cursos.schema()).await.is_err());
}

// ── Against SQLite ───────────────────────────────────────────────

#[tokio::test]
async fn remote_rows_land_with_typed_values() {
    let local = Arc::new(local_store());
    let remote = Arc::new(MemoryStore::remote());
    let table = SyncTable::Eventos;
    remote
        .insert(
            table.schema(),
            Record::new()
                .with("id", id(1))
                .with("nome", "Hackathon")
                .with("data_inicio", "2024-08-10T12:00:00.000Z")
                .with("ativo", true)
                .with("configuracoes", FieldValue::Json(serde_json::json!({"equipes": 4}))),
        )
        .unwrap();

    let sync = TableSynchronizer::new(local.clone(), remote.clone(), ConflictPolicy::default()).unwrap();
    let first = sync.sync(table, SyncDirection::Bidirectional).await;
    assert_eq!((first.synced, first.errors), (1, 0));

    let row = local
        .database()
        .find("eventos", "id", &RecordKey::from(id(1)))
        .unwrap()
        .unwrap();
    assert_eq!(
        row.get("dataInicio"),
        Some(&FieldValue::Timestamp(
            Utc.with_ymd_and_hms(2024, 8, 10, 12, 0, 0).unwrap()
        ))
    );
    assert_eq!(row.get("ativo"), Some(&FieldValue::Bool(true)));

    let second = sync.sync(table, SyncDirection::Bidirectional).await;
    assert_eq!(second.synced, 0);
    assert_eq!(remote.writes(), 0);
}

#[tokio::test]
async fn uuid_keyed_rows_sync_end_to_end() {
    let local = Arc::new(local_store());
    let remote = Arc::new(MemoryStore::remote());
    let table = SyncTable::Turmas;
    let turma = "8c1f0f2e-4b7a-4c1e-9d3a-2f6b5e7c8a90";
    let curso = "0b9e4d2c-1a3f-4e5b-8c7d-6e9f0a1b2c3d";
    remote
        .insert(
            table.schema(),
            Record::new()
                .with("id", turma)
                .with("curso_id", curso)
                .with("codigo_turma", "T1"),
        )
        .unwrap();

    let sync = TableSynchronizer::new(local.clone(), remote.clone(), ConflictPolicy::default()).unwrap();
    let pulled = sync.sync(table, SyncDirection::FromSupabase).await;
    assert_eq!((pulled.synced, pulled.errors), (1, 0));

    let row = local
        .database()
        .find("turmas", "id", &RecordKey::from(turma))
        .unwrap()
        .unwrap();
    assert_eq!(row.get("cursoId"), Some(&FieldValue::from(curso)));
    assert_eq!(row.get("codigoTurma"), Some(&FieldValue::from("T1")));

    let again = sync.sync(table, SyncDirection::Bidirectional).await;
    assert_eq!((again.synced, again.errors), (0, 0));
    assert_eq!(remote.writes(), 0);
}

#[tokio::test]
async fn pushing_sqlite_rows_is_idempotent() {
    let local = Arc::new(local_store());
    let remote = Arc::new(MemoryStore::remote());
    let table = SyncTable::Aulas;
    local
        .create(
            table.schema(),
            &Record::new()
                .with("id", id(1))
                .with("nomeAula", "Introdução")
                .with("dataAula", Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()),
        )
        .await
        .unwrap();

    let sync = TableSynchronizer::new(local.clone(), remote.clone(), ConflictPolicy::default()).unwrap();
    assert_eq!(sync.sync(table, SyncDirection::ToSupabase).await.synced, 1);

    let pushed = remote.get(table.schema(), &RecordKey::from(id(1))).unwrap();
    assert_eq!(
        pushed.get("data_aula"),
        Some(&FieldValue::from("2024-03-15T00:00:00.000Z"))
    );
    assert_eq!(pushed.get("conteudo_ministrado"), Some(&FieldValue::Null));

    assert_eq!(sync.sync(table, SyncDirection::ToSupabase).await.synced, 0);
}

#[tokio::test]
async fn unknown_remote_columns_are_dropped_locally() {
    let local = Arc::new(local_store());
    let remote = Arc::new(MemoryStore::remote());
    let table = SyncTable::Cursos;
    remote
        .insert(
            table.schema(),
            Record::new().with("id", id(1)).with("nome_curso", "A").with("coluna_nova", "x"),
        )
        .unwrap();

    let sync = TableSynchronizer::new(local.clone(), remote, ConflictPolicy::default()).unwrap();
    let result = sync.sync(table, SyncDirection::FromSupabase).await;

    assert_eq!((result.synced, result.errors), (1, 0));
    let row = local
        .database()
        .find("cursos", "id", &RecordKey::from(id(1)))
        .unwrap()
        .unwrap();
    assert!(!row.contains("colunaNova"));
}

#[tokio::test]
async fn on_disk_database_keeps_synced_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mdx.db");
    let table = SyncTable::Escolas;

    {
        let db = Database::open(&path).unwrap();
        db.ensure_schema(&[table.schema()]).unwrap();
        let remote = Arc::new(MemoryStore::remote());
        remote
            .insert(table.schema(), Record::new().with("id", id(1)).with("nome", "EE Centro"))
            .unwrap();
        let sync =
            TableSynchronizer::new(Arc::new(LocalStore::new(db)), remote, ConflictPolicy::default())
                .unwrap();
        sync.sync(table, SyncDirection::FromSupabase).await;
    }

    let store = LocalStore::new(Database::open(&path).unwrap());
    assert_eq!(store.count(table.schema()).await.unwrap(), 1);
}
