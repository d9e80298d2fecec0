//! Chunk framing
//!
//! The host calls [`format_record`] for every record and concatenates the
//! results into a [`Chunk`]. Structured formats frame one JSON document per
//! line; flat formats carry the finished delimited line verbatim.

use crate::error::{Error, Result};
use crate::types::{FileFormat, JsonValue, Record};
use bytes::{Bytes, BytesMut};

/// Frame one record for the buffer
///
/// For flat formats a record without the log field yields no bytes.
pub fn format_record(format: FileFormat, log_field: &str, record: &Record) -> Result<Vec<u8>> {
    let mut out = match format {
        FileFormat::Json => serde_json::to_vec(record)?,
        FileFormat::Envelope => {
            let mut envelope = Record::new();
            envelope.insert(log_field.to_string(), JsonValue::Object(record.clone()));
            serde_json::to_vec(&envelope)?
        }
        FileFormat::Tsv | FileFormat::Csv => match record.get(log_field) {
            None | Some(JsonValue::Null) => return Ok(Vec::new()),
            Some(JsonValue::String(line)) => line.trim_end_matches('\n').as_bytes().to_vec(),
            Some(other) => other.to_string().into_bytes(),
        },
    };
    out.push(b'\n');
    Ok(out)
}

/// A batch of framed records handed to the sink as one unit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    data: Bytes,
}

impl Chunk {
    /// Wrap already framed bytes
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// Frame `records` into a chunk
    pub fn from_records<'a>(
        format: FileFormat,
        log_field: &str,
        records: impl IntoIterator<Item = &'a Record>,
    ) -> Result<Self> {
        let mut buffer = ChunkBuffer::new(format, log_field);
        for record in records {
            buffer.push(record)?;
        }
        Ok(buffer.take())
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the chunk holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Non-blank lines, each one framed record
    pub fn entries(&self) -> impl Iterator<Item = &[u8]> {
        self.data
            .split(|b| *b == b'\n')
            .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
    }
}

/// Accumulates framed records until the host cuts a chunk
#[derive(Debug)]
pub struct ChunkBuffer {
    format: FileFormat,
    log_field: String,
    buf: BytesMut,
    records: usize,
}

impl ChunkBuffer {
    /// Create an empty buffer
    pub fn new(format: FileFormat, log_field: impl Into<String>) -> Self {
        Self {
            format,
            log_field: log_field.into(),
            buf: BytesMut::new(),
            records: 0,
        }
    }

    /// Frame and append a record
    pub fn push(&mut self, record: &Record) -> Result<()> {
        let framed = format_record(self.format, &self.log_field, record)
            .map_err(|e| Error::serialize(format!("failed to frame record: {e}")))?;
        if !framed.is_empty() {
            self.buf.extend_from_slice(&framed);
            self.records += 1;
        }
        Ok(())
    }

    /// Number of records buffered
    pub fn records(&self) -> usize {
        self.records
    }

    /// Bytes buffered
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Cut the buffered records into a chunk, leaving the buffer empty
    pub fn take(&mut self) -> Chunk {
        self.records = 0;
        Chunk::new(self.buf.split().freeze())
    }
}
