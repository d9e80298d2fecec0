//! Schema-ordered row serialization

use super::escape::escape_with;
use crate::error::{Error, Result};
use crate::schema::TableSchema;
use crate::types::{JsonValue, LogTag, Record};
use tracing::warn;

/// Turns records into delimited COPY rows
#[derive(Debug, Clone)]
pub struct RecordSerializer {
    /// Field delimiter
    delimiter: char,
    /// Suffix for log lines
    log_tag: LogTag,
}

impl Default for RecordSerializer {
    fn default() -> Self {
        Self::new('\t')
    }
}

impl RecordSerializer {
    /// Create a serializer for a delimiter
    pub fn new(delimiter: char) -> Self {
        Self {
            delimiter,
            log_tag: LogTag::default(),
        }
    }

    /// Set the log tag
    #[must_use]
    pub fn with_log_tag(mut self, log_tag: LogTag) -> Self {
        self.log_tag = log_tag;
        self
    }

    /// The delimiter in use
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Serialize `record` against `schema`
    ///
    /// Returns one newline-terminated line with a field per column, or an
    /// empty string when no column has a value (the row is skipped).
    pub fn serialize(&self, schema: &TableSchema, record: &Record) -> Result<String> {
        let mut fields = Vec::with_capacity(schema.len());
        for column in schema.columns() {
            fields.push(field_text(record.get(column))?);
        }

        if fields.iter().all(String::is_empty) {
            warn!(
                columns = ?schema.columns(),
                "{}",
                self.log_tag.format(format!(
                    "no data match for table columns. data={}",
                    JsonValue::Object(record.clone())
                ))
            );
            return Ok(String::new());
        }

        let mut line = String::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                line.push(self.delimiter);
            }
            if !field.is_empty() {
                line.push_str(&escape_with(field, self.delimiter));
            }
        }
        line.push('\n');
        Ok(line)
    }
}

/// Text of a single cell before escaping; empty means "no value"
fn field_text(value: Option<&JsonValue>) -> Result<String> {
    match value {
        None | Some(JsonValue::Null) => Ok(String::new()),
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(JsonValue::Bool(b)) => Ok(b.to_string()),
        Some(JsonValue::Number(n)) => Ok(n.to_string()),
        Some(nested @ (JsonValue::Object(_) | JsonValue::Array(_))) => serde_json::to_string(nested)
            .map_err(|e| Error::serialize(format!("failed to encode nested value: {e}"))),
    }
}
