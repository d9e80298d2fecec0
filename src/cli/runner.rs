//! CLI runner - executes commands

use crate::chunk::Chunk;
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::SinkConfig;
use crate::error::{Error, Result, ResultExt};
use crate::sink::{RedshiftSink, WriteOutcome};
use crate::types::Record;
use crate::warehouse::PostgresWarehouse;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Longest wait between chunk retries
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Load {
                input,
                chunk_records,
                max_retries,
                retry_wait_ms,
            } => {
                let retry = RetryPolicy {
                    max_retries: *max_retries,
                    initial_wait: Duration::from_millis(*retry_wait_ms),
                };
                self.load(input, *chunk_records, retry).await
            }
            Commands::Columns { refresh } => self.columns(*refresh).await,
            Commands::CopySql { key } => self.copy_sql(key),
            Commands::Check => self.check().await,
        }
    }

    /// Load the sink configuration
    fn load_config(&self) -> Result<SinkConfig> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Config file not specified (use -C flag)"))?;
        SinkConfig::from_file(path)
    }

    fn build_sink(&self) -> Result<RedshiftSink> {
        RedshiftSink::from_config(self.load_config()?)
    }

    /// Read records, cut them into chunks, write each chunk with retries
    async fn load(&self, input: &str, chunk_records: usize, retry: RetryPolicy) -> Result<()> {
        if chunk_records == 0 {
            return Err(Error::invalid_value("chunk-records", "must be at least 1"));
        }

        let sink = self.build_sink()?;
        let mut lines = open_input(input).await?.lines();
        let mut buffer = sink.chunk_buffer();
        let mut stats = LoadStats::default();
        let start = Instant::now();

        while let Some(line) = lines.next_line().await.context("Failed to read input")? {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Record>(&line) {
                Ok(record) => buffer.push(&record)?,
                Err(e) => {
                    warn!(error = %e, "skipping input line that is not a JSON object");
                    stats.invalid_lines += 1;
                    continue;
                }
            }

            if buffer.records() >= chunk_records {
                let records = buffer.records();
                self.flush(&sink, buffer.take(), records, &retry, &mut stats)
                    .await?;
            }
        }

        if !buffer.is_empty() {
            let records = buffer.records();
            self.flush(&sink, buffer.take(), records, &retry, &mut stats)
                .await?;
        }

        info!(
            chunks = stats.chunks,
            rows = stats.rows,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "load finished"
        );
        self.output_message(&json!({
            "type": "SUMMARY",
            "chunks": stats.chunks,
            "loaded": stats.loaded,
            "empty": stats.empty,
            "soft_skipped": stats.soft_skipped,
            "rows": stats.rows,
            "invalid_lines": stats.invalid_lines,
        }));
        Ok(())
    }

    /// Write one chunk, retrying fatal errors with exponential backoff
    async fn flush(
        &self,
        sink: &RedshiftSink,
        chunk: Chunk,
        records: usize,
        retry: &RetryPolicy,
        stats: &mut LoadStats,
    ) -> Result<()> {
        stats.chunks += 1;
        let mut attempt = 0;

        let outcome = loop {
            match sink.write(&chunk).await {
                Ok(outcome) => break outcome,
                Err(e) if e.is_fatal() && attempt < retry.max_retries => {
                    let delay = retry.backoff(attempt);
                    warn!(
                        "Chunk {} failed: {}, attempt {}/{}, retrying in {:?}",
                        stats.chunks,
                        e,
                        attempt + 1,
                        retry.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        match &outcome {
            WriteOutcome::Loaded { rows, .. } => {
                stats.loaded += 1;
                stats.rows += rows;
            }
            WriteOutcome::Empty => stats.empty += 1,
            WriteOutcome::SoftSkip { .. } => stats.soft_skipped += 1,
        }

        let mut msg = json!({
            "type": "CHUNK",
            "chunk": stats.chunks,
            "records": records,
            "attempts": attempt + 1,
        });
        if let (Value::Object(msg), Ok(Value::Object(result))) =
            (&mut msg, serde_json::to_value(&outcome))
        {
            msg.extend(result);
        }
        self.output_message(&msg);
        Ok(())
    }

    /// Print the table columns
    async fn columns(&self, refresh: bool) -> Result<()> {
        let sink = self.build_sink()?;
        let schema = sink.columns(refresh).await?;
        self.output_message(&json!({
            "type": "COLUMNS",
            "table": sink.table().to_string(),
            "columns": schema.columns(),
        }));
        Ok(())
    }

    /// Print the redacted COPY statement for `key`
    fn copy_sql(&self, key: &str) -> Result<()> {
        let sink = self.build_sink()?;
        self.output_message(&json!({
            "type": "COPY_SQL",
            "sql": sink.copy_sql(key),
        }));
        Ok(())
    }

    /// Connect to the warehouse and resolve the table
    async fn check(&self) -> Result<()> {
        let config = self.load_config()?;
        let warehouse = PostgresWarehouse::new(&config.warehouse);

        let status = match warehouse.ping().await {
            Ok(()) => {
                let sink = RedshiftSink::from_config(config)?;
                match sink.columns(true).await {
                    Ok(schema) if schema.is_empty() => json!({
                        "status": "FAILED",
                        "message": format!("Table {} has no visible columns", sink.table()),
                    }),
                    Ok(schema) => json!({
                        "status": "SUCCEEDED",
                        "message": format!("Table {} has {} columns", sink.table(), schema.len()),
                    }),
                    Err(e) => json!({ "status": "FAILED", "message": e.to_string() }),
                }
            }
            Err(e) => json!({ "status": "FAILED", "message": e.to_string() }),
        };

        self.output_message(&json!({
            "type": "CONNECTION_STATUS",
            "connectionStatus": status,
        }));
        Ok(())
    }

    /// Output a message in the requested format
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Open a file, or stdin for `-`
async fn open_input(input: &str) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    if input == "-" {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    match tokio::fs::File::open(input).await {
        Ok(file) => Ok(Box::new(BufReader::new(file))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::FileNotFound {
            path: input.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Chunk retry settings
#[derive(Debug, Clone)]
struct RetryPolicy {
    max_retries: u32,
    initial_wait: Duration,
}

impl RetryPolicy {
    /// Exponential backoff capped at [`MAX_BACKOFF`]
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        std::cmp::min(self.initial_wait.saturating_mul(factor), MAX_BACKOFF)
    }
}

#[derive(Debug, Default)]
struct LoadStats {
    chunks: usize,
    loaded: usize,
    empty: usize,
    soft_skipped: usize,
    rows: usize,
    invalid_lines: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let retry = RetryPolicy {
            max_retries: 10,
            initial_wait: Duration::from_millis(500),
        };
        assert_eq!(retry.backoff(0), Duration::from_millis(500));
        assert_eq!(retry.backoff(1), Duration::from_secs(1));
        assert_eq!(retry.backoff(3), Duration::from_secs(4));
        assert_eq!(retry.backoff(8), MAX_BACKOFF);
        assert_eq!(retry.backoff(40), MAX_BACKOFF);
    }

    #[tokio::test]
    async fn test_missing_input_file() {
        let err = open_input("/nonexistent/events.jsonl").await.err().unwrap();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}
