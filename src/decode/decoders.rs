//! Decoder implementations
//!
//! Each decoder handles one structured record format.

use super::types::RecordDecoder;
use crate::error::{Error, Result};
use crate::types::{FileFormat, JsonValue, Record};

/// Parse a chunk entry as a JSON object
fn parse_entry(entry: &[u8]) -> Result<Record> {
    match serde_json::from_slice::<JsonValue>(entry) {
        Ok(JsonValue::Object(map)) => Ok(map),
        Ok(other) => Err(Error::decode(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(Error::decode(format!("failed to parse entry: {e}"))),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

// ============================================================================
// JSON-in-field Decoder
// ============================================================================

/// Decodes records whose log field holds a JSON object encoded as a string
#[derive(Debug, Clone)]
pub struct JsonFieldDecoder {
    /// Field carrying the JSON text
    field: String,
}

impl JsonFieldDecoder {
    /// Create a decoder reading `field`
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl RecordDecoder for JsonFieldDecoder {
    fn decode(&self, entry: &[u8]) -> Result<Record> {
        let outer = parse_entry(entry)?;
        match outer.get(&self.field) {
            Some(JsonValue::String(text)) => match serde_json::from_str::<JsonValue>(text) {
                Ok(JsonValue::Object(map)) => Ok(map),
                Ok(other) => Err(Error::decode(format!(
                    "field '{}' holds {}, expected a JSON object",
                    self.field,
                    json_kind(&other)
                ))),
                Err(e) => Err(Error::decode(format!(
                    "field '{}' is not valid JSON: {e}",
                    self.field
                ))),
            },
            // Already structured upstream
            Some(JsonValue::Object(map)) => Ok(map.clone()),
            Some(other) => Err(Error::decode(format!(
                "field '{}' holds {}, expected JSON text",
                self.field,
                json_kind(other)
            ))),
            None => Err(Error::decode(format!("field '{}' is missing", self.field))),
        }
    }
}

// ============================================================================
// Envelope Decoder
// ============================================================================

/// Decodes records wrapped as `{ "<field>": { ...record } }`
#[derive(Debug, Clone)]
pub struct EnvelopeDecoder {
    /// Field carrying the wrapped record
    field: String,
}

impl EnvelopeDecoder {
    /// Create a decoder unwrapping `field`
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl RecordDecoder for EnvelopeDecoder {
    fn decode(&self, entry: &[u8]) -> Result<Record> {
        let mut outer = parse_entry(entry)?;
        match outer.remove(&self.field) {
            Some(JsonValue::Object(map)) => Ok(map),
            Some(other) => Err(Error::decode(format!(
                "envelope field '{}' holds {}, expected an object",
                self.field,
                json_kind(&other)
            ))),
            None => Err(Error::decode(format!(
                "envelope field '{}' is missing",
                self.field
            ))),
        }
    }
}

/// Decoder for a structured format; `None` for pass-through formats
pub fn decoder_for(format: FileFormat, field: &str) -> Option<Box<dyn RecordDecoder>> {
    match format {
        FileFormat::Json => Some(Box::new(JsonFieldDecoder::new(field))),
        FileFormat::Envelope => Some(Box::new(EnvelopeDecoder::new(field))),
        FileFormat::Tsv | FileFormat::Csv => None,
    }
}
