//! Tests for warehouse module

use super::*;
use crate::error::Error;
use crate::schema::TableIdentifier;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use test_case::test_case;

/// Client that records statements and answers with a fixed result
struct FakeClient {
    response: std::result::Result<(), LoadFailure>,
    executed: Mutex<Vec<String>>,
}

impl FakeClient {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            response: Ok(()),
            executed: Mutex::new(Vec::new()),
        })
    }

    fn failing(code: Option<&str>, message: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Err(LoadFailure::new(code.map(str::to_string), message)),
            executed: Mutex::new(Vec::new()),
        })
    }

    fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl WarehouseClient for FakeClient {
    async fn execute(&self, sql: &str) -> std::result::Result<(), LoadFailure> {
        self.executed.lock().unwrap().push(sql.to_string());
        self.response.clone()
    }
}

fn template() -> CopyTemplate {
    CopyTemplate::new(
        TableIdentifier::table("events"),
        "staging",
        Credentials::Keys {
            access_key_id: "AKIA".to_string(),
            secret_access_key: "s3cr3t".to_string(),
        },
        '\t',
    )
    .with_options("TRUNCATECOLUMNS", "")
}

// ============================================================================
// Classification Tests
// ============================================================================

#[test_case("ERROR:  Load into table 'events' failed.  Check 'stl_load_errors' system table for details." ; "with prefix")]
#[test_case("Load into table 'events' failed.  Check 'stl_load_errors' system table for details." ; "server message")]
#[test_case("error: load into table 'public.events' failed." ; "lower case")]
fn test_rejected_data_is_soft(message: &str) {
    let failure = LoadFailure::new(Some("XX000".to_string()), message);
    assert_eq!(classify_load_error(&failure), LoadErrorClass::Soft);
}

#[test_case("ERROR:  relation \"events\" does not exist" ; "missing table")]
#[test_case("S3ServiceException:Access Denied,Status 403" ; "access denied")]
#[test_case("connection refused" ; "connection")]
#[test_case("ERROR:  Load into table events failed" ; "unquoted table")]
#[test_case("retry: Load into table 'events' failed" ; "not at start")]
fn test_other_failures_are_fatal(message: &str) {
    let failure = LoadFailure::new(None, message);
    assert_eq!(classify_load_error(&failure), LoadErrorClass::Fatal);
}

#[test]
fn test_failure_display() {
    let failure = LoadFailure::new(Some("42P01".to_string()), "relation \"events\" does not exist");
    assert_eq!(
        failure.to_string(),
        "relation \"events\" does not exist (SQLSTATE 42P01)"
    );
    assert_eq!(LoadFailure::new(None, "timeout").to_string(), "timeout");
}

// ============================================================================
// Loader Tests
// ============================================================================

#[tokio::test]
async fn test_load_success() {
    let client = FakeClient::ok();
    let loader = WarehouseLoader::new(client.clone(), template());

    let outcome = loader.load("logs/20240309-0705_00.gz").await.unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded);

    let executed = client.executed();
    assert_eq!(executed.len(), 1);
    assert!(executed[0].starts_with("COPY events FROM 's3://staging/logs/20240309-0705_00.gz'"));
    assert!(executed[0].contains("aws_secret_access_key=s3cr3t"));
}

#[tokio::test]
async fn test_load_rejected_data_is_soft_skip() {
    let client = FakeClient::failing(
        Some("XX000"),
        "ERROR:  Load into table 'events' failed.",
    );
    let loader = WarehouseLoader::new(client.clone(), template());

    let outcome = loader.load("k_00.gz").await.unwrap();
    assert_eq!(outcome, LoadOutcome::SoftSkip);
    assert_eq!(client.executed().len(), 1);
}

#[tokio::test]
async fn test_load_other_failure_is_fatal() {
    let client = FakeClient::failing(Some("42P01"), "ERROR:  relation \"events\" does not exist");
    let loader = WarehouseLoader::new(client, template());

    let err = loader.load("k_00.gz").await.unwrap_err();
    assert!(matches!(err, Error::LoadFatal { .. }));
    assert!(err.is_fatal());

    let message = err.to_string();
    assert!(message.contains("does not exist"));
    assert!(message.contains(REDACTED));
    assert!(!message.contains("s3cr3t"));
}
