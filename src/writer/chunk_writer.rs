//! Chunk to gzip staging file

use super::types::{ChunkOutcome, StagedFile};
use crate::chunk::Chunk;
use crate::decode::{decoder_for, RecordDecoder};
use crate::error::{Error, Result};
use crate::schema::{SchemaResolver, TableIdentifier, TableSchema};
use crate::serialize::RecordSerializer;
use crate::types::{FileFormat, LogTag};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, error, warn};

/// Writes one chunk into a compressed staging file
pub struct ChunkWriter {
    /// Record format
    format: FileFormat,
    /// Target table, for schema resolution
    table: TableIdentifier,
    /// Shared schema cache
    resolver: Arc<SchemaResolver>,
    /// Row serializer
    serializer: RecordSerializer,
    /// Decoder for structured formats
    decoder: Option<Box<dyn RecordDecoder>>,
    /// Directory for staging files (system temp dir when unset)
    temp_dir: Option<PathBuf>,
    /// Gzip level
    compression: Compression,
    /// Suffix for log lines
    log_tag: LogTag,
}

impl ChunkWriter {
    /// Create a writer
    pub fn new(
        format: FileFormat,
        log_field: &str,
        delimiter: char,
        table: TableIdentifier,
        resolver: Arc<SchemaResolver>,
    ) -> Self {
        Self {
            format,
            table,
            resolver,
            serializer: RecordSerializer::new(delimiter),
            decoder: decoder_for(format, log_field),
            temp_dir: None,
            compression: Compression::default(),
            log_tag: LogTag::default(),
        }
    }

    /// Put staging files in `dir`
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Set the gzip level
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set the log tag
    #[must_use]
    pub fn with_log_tag(mut self, log_tag: LogTag) -> Self {
        self.serializer = self.serializer.clone().with_log_tag(log_tag.clone());
        self.log_tag = log_tag;
        self
    }

    /// Write `chunk` into a gzip file
    ///
    /// Returns [`ChunkOutcome::Empty`] when nothing would be loaded: no usable
    /// rows, an empty flat chunk, or a table with no visible columns.
    pub async fn write(&self, chunk: &Chunk) -> Result<ChunkOutcome> {
        match &self.decoder {
            Some(decoder) => self.write_structured(chunk, decoder.as_ref()).await,
            None => self.write_flat(chunk),
        }
    }

    async fn write_structured(
        &self,
        chunk: &Chunk,
        decoder: &dyn RecordDecoder,
    ) -> Result<ChunkOutcome> {
        let schema = self.resolver.resolve(&self.table).await?;
        if schema.is_empty() {
            let empty = Error::EmptySchema {
                table: self.table.to_string(),
            };
            warn!("{}", self.log_tag.format(format!("{empty}, nothing to load")));
            return Ok(ChunkOutcome::Empty);
        }

        let mut encoder = self.open_encoder()?;
        let mut rows = 0;
        let mut skipped = 0;

        for entry in chunk.entries() {
            match self.build_row(&schema, decoder, entry) {
                Ok(row) if row.is_empty() => skipped += 1,
                Ok(row) => {
                    encoder.write_all(row.as_bytes())?;
                    rows += 1;
                }
                Err(e) if e.is_record_level() => {
                    error!(
                        error = %e,
                        "{}",
                        self.log_tag.format(format!(
                            "failed to create table text from {}. text=({})",
                            self.format,
                            String::from_utf8_lossy(entry)
                        ))
                    );
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        if rows == 0 {
            debug!(skipped, "chunk produced no rows");
            return Ok(ChunkOutcome::Empty);
        }

        let file = encoder.finish()?;
        Ok(ChunkOutcome::Staged(StagedFile::new(file, rows, skipped)?))
    }

    fn write_flat(&self, chunk: &Chunk) -> Result<ChunkOutcome> {
        let rows = chunk.entries().count();
        if rows == 0 {
            return Ok(ChunkOutcome::Empty);
        }

        let mut encoder = self.open_encoder()?;
        encoder.write_all(chunk.as_bytes())?;
        let file = encoder.finish()?;
        Ok(ChunkOutcome::Staged(StagedFile::new(file, rows, 0)?))
    }

    fn build_row(
        &self,
        schema: &TableSchema,
        decoder: &dyn RecordDecoder,
        entry: &[u8],
    ) -> Result<String> {
        let record = decoder.decode(entry)?;
        self.serializer.serialize(schema, &record)
    }

    fn open_encoder(&self) -> Result<GzEncoder<NamedTempFile>> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("solidafy-redshift-").suffix(".gz");
        let file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(GzEncoder::new(file, self.compression))
    }
}
