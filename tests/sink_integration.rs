//! End-to-end sink tests
//!
//! The pipeline runs against an in-memory object store and fake warehouse.
//! `test_postgres_*` tests need a live PostgreSQL (or Redshift) database;
//! set REDSHIFT_TEST_URL to run them.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use flate2::read::GzDecoder;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use pretty_assertions::assert_eq;
use serde_json::json;
use solidafy_redshift::schema::{ColumnCatalog, TableIdentifier};
use solidafy_redshift::warehouse::{
    LoadFailure, PostgresWarehouse, WarehouseClient, REDACTED,
};
use solidafy_redshift::{Chunk, Error, Record, RedshiftSink, SinkConfig, WriteOutcome};
use std::io::Read;
use std::sync::{Arc, Mutex};

const CONFIG: &str = r"
warehouse:
  host: localhost
  database: dev
  user: loader
  table: events
storage:
  bucket: staging
  base_path: logs/
  access_key_id: AKIA
  secret_access_key: s3cr3t
staging:
  timestamp_key_format: '%Y%m%d-%H%M'
";

// ============================================================================
// Fakes
// ============================================================================

struct FakeCatalog {
    columns: Vec<String>,
}

#[async_trait]
impl ColumnCatalog for FakeCatalog {
    async fn fetch_columns(
        &self,
        _table: &TableIdentifier,
    ) -> solidafy_redshift::Result<Vec<String>> {
        Ok(self.columns.clone())
    }
}

#[derive(Default)]
struct FakeWarehouse {
    failure: Option<LoadFailure>,
    executed: Mutex<Vec<String>>,
}

impl FakeWarehouse {
    fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl WarehouseClient for FakeWarehouse {
    async fn execute(&self, sql: &str) -> Result<(), LoadFailure> {
        self.executed.lock().unwrap().push(sql.to_string());
        match &self.failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }
}

struct Harness {
    sink: RedshiftSink,
    store: Arc<InMemory>,
    warehouse: Arc<FakeWarehouse>,
}

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 0).unwrap()
}

fn harness(config: &str, columns: &[&str], failure: Option<LoadFailure>) -> Harness {
    let config = SinkConfig::from_yaml(config).unwrap();
    let store = Arc::new(InMemory::new());
    let warehouse = Arc::new(FakeWarehouse {
        failure,
        ..Default::default()
    });
    let catalog = Arc::new(FakeCatalog {
        columns: columns.iter().map(ToString::to_string).collect(),
    });

    let sink = RedshiftSink::with_parts(config, catalog, warehouse.clone(), store.clone())
        .unwrap()
        .with_clock(fixed_now);

    Harness {
        sink,
        store,
        warehouse,
    }
}

fn record(value: serde_json::Value) -> Record {
    value.as_object().unwrap().clone()
}

/// Wrap a row source as the host emits it: JSON text under `log`
fn log_record(value: serde_json::Value) -> Record {
    record(json!({ "log": value.to_string() }))
}

fn chunk(sink: &RedshiftSink, records: &[Record]) -> Chunk {
    let mut buffer = sink.chunk_buffer();
    for record in records {
        buffer.push(record).unwrap();
    }
    buffer.take()
}

async fn staged_text(store: &InMemory, key: &str) -> String {
    let bytes = store
        .get(&ObjectPath::from(key))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    let mut text = String::new();
    GzDecoder::new(bytes.as_ref())
        .read_to_string(&mut text)
        .unwrap();
    text
}

async fn staged_keys(store: &InMemory) -> Vec<String> {
    store
        .list_with_delimiter(Some(&ObjectPath::from("logs")))
        .await
        .unwrap()
        .objects
        .into_iter()
        .map(|meta| meta.location.to_string())
        .collect()
}

// ============================================================================
// Pipeline Tests
// ============================================================================

#[tokio::test]
async fn test_json_chunk_is_staged_and_loaded() {
    let h = harness(CONFIG, &["ts", "user", "payload"], None);
    let chunk = chunk(
        &h.sink,
        &[
            log_record(json!({"ts": "2020-01-01", "user": "a\tb", "payload": {"k": 1}})),
            log_record(json!({"payload": [1, 2], "ts": "2020-01-02", "extra": true})),
        ],
    );

    let outcome = h.sink.write(&chunk).await.unwrap();
    assert_eq!(
        outcome,
        WriteOutcome::Loaded {
            key: "logs/20240309-0705_00.gz".to_string(),
            rows: 2,
        }
    );

    assert_eq!(
        staged_text(&h.store, "logs/20240309-0705_00.gz").await,
        "2020-01-01\ta\\\tb\t{\"k\":1}\n2020-01-02\t\t[1,2]\n"
    );

    let executed = h.warehouse.executed();
    assert_eq!(executed.len(), 1);
    assert!(executed[0].starts_with(
        "COPY events FROM 's3://staging/logs/20240309-0705_00.gz' \
         CREDENTIALS 'aws_access_key_id=AKIA;aws_secret_access_key=s3cr3t'"
    ));
    assert!(executed[0].ends_with("GZIP ESCAPE TRUNCATECOLUMNS;"));
}

#[tokio::test]
async fn test_empty_chunk_never_uploads_or_loads() {
    let h = harness(CONFIG, &["ts"], None);

    let outcome = h.sink.write(&Chunk::default()).await.unwrap();
    assert_eq!(outcome, WriteOutcome::Empty);
    assert!(staged_keys(&h.store).await.is_empty());
    assert!(h.warehouse.executed().is_empty());
}

#[tokio::test]
async fn test_zero_column_table_is_empty() {
    let h = harness(CONFIG, &[], None);
    let chunk = chunk(&h.sink, &[log_record(json!({"ts": "2020-01-01"}))]);

    let outcome = h.sink.write(&chunk).await.unwrap();
    assert_eq!(outcome, WriteOutcome::Empty);
    assert!(staged_keys(&h.store).await.is_empty());
    assert!(h.warehouse.executed().is_empty());
}

#[tokio::test]
async fn test_only_unusable_records_is_empty() {
    let h = harness(CONFIG, &["ts", "user"], None);
    let chunk = chunk(
        &h.sink,
        &[
            record(json!({"log": "not json"})),
            log_record(json!({"unrelated": 1})),
        ],
    );

    assert_eq!(h.sink.write(&chunk).await.unwrap(), WriteOutcome::Empty);
    assert!(staged_keys(&h.store).await.is_empty());
}

#[tokio::test]
async fn test_malformed_record_is_skipped() {
    let h = harness(CONFIG, &["ts"], None);
    let chunk = chunk(
        &h.sink,
        &[
            log_record(json!({"ts": "a"})),
            record(json!({"log": "{broken"})),
            log_record(json!({"ts": "b"})),
        ],
    );

    let outcome = h.sink.write(&chunk).await.unwrap();
    assert!(matches!(outcome, WriteOutcome::Loaded { rows: 2, .. }));
    assert_eq!(
        staged_text(&h.store, "logs/20240309-0705_00.gz").await,
        "a\nb\n"
    );
}

#[tokio::test]
async fn test_sequential_chunks_get_distinct_keys() {
    let h = harness(CONFIG, &["ts"], None);
    let chunk = chunk(&h.sink, &[log_record(json!({"ts": "a"}))]);

    let first = h.sink.write(&chunk).await.unwrap();
    let second = h.sink.write(&chunk).await.unwrap();

    let key = |outcome: &WriteOutcome| match outcome {
        WriteOutcome::Loaded { key, .. } => key.clone(),
        other => panic!("unexpected outcome: {other:?}"),
    };
    assert_eq!(key(&first), "logs/20240309-0705_00.gz");
    assert_eq!(key(&second), "logs/20240309-0705_01.gz");
    assert_eq!(staged_keys(&h.store).await.len(), 2);
}

#[tokio::test]
async fn test_tsv_chunk_passes_through() {
    let config = format!("{CONFIG}format:\n  file_type: tsv\n");
    let h = harness(&config, &["never", "consulted"], None);
    let chunk = chunk(
        &h.sink,
        &[
            record(json!({"log": "1\tfirst\n"})),
            record(json!({"other": "no log field"})),
            record(json!({"log": "2\tsecond"})),
        ],
    );

    let outcome = h.sink.write(&chunk).await.unwrap();
    assert!(matches!(outcome, WriteOutcome::Loaded { .. }));
    assert_eq!(
        staged_text(&h.store, "logs/20240309-0705_00.gz").await,
        "1\tfirst\n2\tsecond\n"
    );
}

#[tokio::test]
async fn test_excluded_column_is_left_out() {
    let config = CONFIG.replace("table: events", "table: events\n  exclude_column: id");
    let h = harness(&config, &["id", "ts", "user"], None);
    let chunk = chunk(&h.sink, &[log_record(json!({"id": 9, "ts": "t", "user": "u"}))]);

    h.sink.write(&chunk).await.unwrap();
    assert_eq!(
        staged_text(&h.store, "logs/20240309-0705_00.gz").await,
        "t\tu\n"
    );
    assert_eq!(h.sink.columns(false).await.unwrap().columns(), ["ts", "user"]);
}

// ============================================================================
// Load Outcome Tests
// ============================================================================

#[tokio::test]
async fn test_rejected_data_is_soft_skip() {
    let failure = LoadFailure::new(
        Some("XX000".to_string()),
        "Load into table 'events' failed.  Check 'stl_load_errors' system table for details.",
    );
    let h = harness(CONFIG, &["ts"], Some(failure));
    let chunk = chunk(&h.sink, &[log_record(json!({"ts": "a"}))]);

    let outcome = h.sink.write(&chunk).await.unwrap();
    assert_eq!(
        outcome,
        WriteOutcome::SoftSkip {
            key: "logs/20240309-0705_00.gz".to_string()
        }
    );
}

#[tokio::test]
async fn test_other_load_failure_is_fatal() {
    let failure = LoadFailure::new(
        Some("42P01".to_string()),
        "ERROR:  relation \"events\" does not exist",
    );
    let h = harness(CONFIG, &["ts"], Some(failure));
    let chunk = chunk(&h.sink, &[log_record(json!({"ts": "a"}))]);

    let err = h.sink.write(&chunk).await.unwrap_err();
    assert!(matches!(err, Error::LoadFatal { .. }));
    assert!(err.is_fatal());
    assert!(!err.to_string().contains("s3cr3t"));
}

#[test]
fn test_copy_sql_is_redacted() {
    let h = harness(CONFIG, &["ts"], None);
    let sql = h.sink.copy_sql("logs/x_00.gz");
    assert!(sql.contains(&format!("CREDENTIALS '{REDACTED}'")));
    assert!(!sql.contains("s3cr3t"));
}

#[test]
fn test_format_matches_buffer_framing() {
    let h = harness(CONFIG, &["ts"], None);
    let record = log_record(json!({"ts": "a"}));
    let framed = h.sink.format(&record).unwrap();

    let mut buffer = h.sink.chunk_buffer();
    buffer.push(&record).unwrap();
    assert_eq!(buffer.take().as_bytes(), framed.as_slice());
}

// ============================================================================
// Live Database Tests
// ============================================================================

/// Get test connection string from environment or skip
fn get_test_connection() -> Option<String> {
    std::env::var("REDSHIFT_TEST_URL").ok()
}

#[tokio::test]
async fn test_postgres_catalog_columns() {
    let Some(url) = get_test_connection() else {
        println!("Skipping: REDSHIFT_TEST_URL not set");
        return;
    };

    let warehouse = PostgresWarehouse::from_url(&url).unwrap();
    warehouse.ping().await.unwrap();

    let table = format!("solidafy_it_{}", std::process::id());
    warehouse
        .execute(&format!(
            "CREATE TABLE public.{table} \
             (ts varchar(32), user_name varchar(64), payload varchar(256))"
        ))
        .await
        .unwrap();

    let columns = warehouse
        .fetch_columns(&TableIdentifier::new(Some("public".to_string()), table.clone()))
        .await;
    let missing = warehouse
        .fetch_columns(&TableIdentifier::table("solidafy_it_missing_table"))
        .await;
    warehouse
        .execute(&format!("DROP TABLE public.{table}"))
        .await
        .unwrap();

    assert_eq!(columns.unwrap(), ["ts", "user_name", "payload"]);
    assert!(missing.unwrap().is_empty());
}

#[tokio::test]
async fn test_postgres_missing_relation_is_fatal() {
    let Some(url) = get_test_connection() else {
        println!("Skipping: REDSHIFT_TEST_URL not set");
        return;
    };

    let warehouse = PostgresWarehouse::from_url(&url).unwrap();
    let failure = warehouse
        .execute("SELECT * FROM solidafy_it_missing_table")
        .await
        .unwrap_err();

    assert_eq!(failure.code.as_deref(), Some("42P01"));
    assert_eq!(
        solidafy_redshift::warehouse::classify_load_error(&failure),
        solidafy_redshift::warehouse::LoadErrorClass::Fatal
    );
}
