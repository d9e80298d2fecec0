//! Redshift sink
//!
//! Entry point for the host: frame records with [`RedshiftSink::format`],
//! hand each finished chunk to [`RedshiftSink::write`].
//!
//! A chunk goes through the whole pipeline on the calling task:
//!
//! ```text
//! Chunk ─► ChunkWriter ─► StagedFile (.gz) ─► StagingUploader ─► s3://bucket/key
//!                                                                      │
//!                                         WriteOutcome ◄─ WarehouseLoader (COPY)
//! ```

use crate::chunk::{format_record, Chunk, ChunkBuffer};
use crate::config::SinkConfig;
use crate::error::Result;
use crate::schema::{ColumnCatalog, SchemaResolver, TableIdentifier, TableSchema};
use crate::staging::{build_store, KeyTemplate, StagingUploader};
use crate::types::{LogTag, Record};
use crate::warehouse::{
    CopyTemplate, LoadOutcome, PostgresWarehouse, WarehouseClient, WarehouseLoader,
};
use crate::writer::{ChunkOutcome, ChunkWriter};
use chrono::{DateTime, Utc};
use object_store::ObjectStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of writing one chunk
///
/// Fatal failures are returned as `Err`; the host should retry the chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WriteOutcome {
    /// Rows committed to the table
    Loaded {
        /// Staged object key
        key: String,
        /// Rows in the staged file
        rows: usize,
    },
    /// Nothing to load
    Empty,
    /// Staged, but the warehouse rejected the data
    SoftSkip {
        /// Staged object key
        key: String,
    },
}

/// Chunked writer from log records into a Redshift table
pub struct RedshiftSink {
    config: SinkConfig,
    table: TableIdentifier,
    resolver: Arc<SchemaResolver>,
    writer: ChunkWriter,
    uploader: StagingUploader,
    loader: WarehouseLoader,
    log_tag: LogTag,
}

impl RedshiftSink {
    /// Build a sink talking to the configured warehouse and bucket
    pub fn from_config(config: SinkConfig) -> Result<Self> {
        let warehouse = Arc::new(PostgresWarehouse::new(&config.warehouse));
        let store = build_store(&config.storage)?;
        Self::with_parts(config, warehouse.clone(), warehouse, store)
    }

    /// Build a sink over explicit catalog, warehouse client and store
    pub fn with_parts(
        config: SinkConfig,
        catalog: Arc<dyn ColumnCatalog>,
        client: Arc<dyn WarehouseClient>,
        store: Arc<dyn ObjectStore>,
    ) -> Result<Self> {
        config.validate()?;

        let log_tag = config.log_tag();
        let table = config.warehouse.table_identifier();
        let delimiter = config.format.delimiter()?;

        let resolver = Arc::new(
            SchemaResolver::new(catalog)
                .with_excluded_column(config.warehouse.exclude_column.clone()),
        );

        let writer = ChunkWriter::new(
            config.format.file_type,
            &config.format.log_field,
            delimiter,
            table.clone(),
            Arc::clone(&resolver),
        )
        .with_log_tag(log_tag.clone());

        let key_template = KeyTemplate::new(
            config.storage.base_path.clone(),
            config.staging.timestamp_key_format.clone(),
            config.staging.utc,
        )?;
        let uploader = StagingUploader::new(store, config.storage.bucket.clone(), key_template)
            .with_conditional_put(config.storage.conditional_put)
            .with_log_tag(log_tag.clone());

        let loader = WarehouseLoader::new(client, CopyTemplate::from_config(&config)?)
            .with_log_tag(log_tag.clone());

        info!(
            table = %table,
            bucket = %config.storage.bucket,
            format = %config.format.file_type,
            "redshift sink ready"
        );

        Ok(Self {
            config,
            table,
            resolver,
            writer,
            uploader,
            loader,
            log_tag,
        })
    }

    /// Replace the clock used for staging keys
    #[must_use]
    pub fn with_clock(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.uploader = self.uploader.with_clock(now);
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    /// Target table
    pub fn table(&self) -> &TableIdentifier {
        &self.table
    }

    /// Frame one record for a chunk
    pub fn format(&self, record: &Record) -> Result<Vec<u8>> {
        format_record(self.config.format.file_type, &self.config.format.log_field, record)
    }

    /// An empty buffer framing records the way [`RedshiftSink::format`] does
    pub fn chunk_buffer(&self) -> ChunkBuffer {
        ChunkBuffer::new(self.config.format.file_type, self.config.format.log_field.clone())
    }

    /// Stage `chunk` and COPY it into the table
    pub async fn write(&self, chunk: &Chunk) -> Result<WriteOutcome> {
        if chunk.is_empty() {
            debug!("{}", self.log_tag.format("skipping empty chunk"));
            return Ok(WriteOutcome::Empty);
        }

        let staged = match self.writer.write(chunk).await? {
            ChunkOutcome::Staged(staged) => staged,
            ChunkOutcome::Empty => {
                info!("{}", self.log_tag.format("no data to load"));
                return Ok(WriteOutcome::Empty);
            }
        };

        debug!(
            rows = staged.rows(),
            skipped = staged.skipped(),
            size = staged.size(),
            "staging file written"
        );

        let object = self.uploader.upload_file(staged.path()).await?;
        let outcome = match self.loader.load(&object.key).await? {
            LoadOutcome::Loaded => WriteOutcome::Loaded {
                key: object.key,
                rows: staged.rows(),
            },
            LoadOutcome::SoftSkip => WriteOutcome::SoftSkip { key: object.key },
        };
        Ok(outcome)
    }

    /// Columns of the target table, optionally bypassing the cache
    pub async fn columns(&self, refresh: bool) -> Result<Arc<TableSchema>> {
        if refresh {
            self.resolver.invalidate(&self.table).await;
        }
        self.resolver.resolve(&self.table).await
    }

    /// The COPY statement for `key`, credentials masked
    pub fn copy_sql(&self, key: &str) -> String {
        self.loader.template().render_redacted(key)
    }
}
