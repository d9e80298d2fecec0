//! Common types used throughout Solidafy Redshift
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// A single log record: field name to scalar or nested value, in insertion order
pub type Record = serde_json::Map<String, JsonValue>;

// ============================================================================
// File Format
// ============================================================================

/// Format of the records handed to the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// The log field holds a JSON object encoded as a string
    #[default]
    Json,
    /// The whole record travels wrapped under the log field
    Envelope,
    /// The log field holds a finished tab-separated line
    Tsv,
    /// The log field holds a finished comma-separated line
    Csv,
}

impl FileFormat {
    /// Delimiter used when the config does not override it
    pub fn default_delimiter(self) -> char {
        match self {
            FileFormat::Csv => ',',
            FileFormat::Json | FileFormat::Envelope | FileFormat::Tsv => '\t',
        }
    }
}

impl std::str::FromStr for FileFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(FileFormat::Json),
            "envelope" => Ok(FileFormat::Envelope),
            "tsv" => Ok(FileFormat::Tsv),
            "csv" => Ok(FileFormat::Csv),
            other => Err(Error::invalid_value(
                "format.file_type",
                format!("unsupported file type '{other}' (expected json, envelope, tsv or csv)"),
            )),
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFormat::Json => write!(f, "json"),
            FileFormat::Envelope => write!(f, "envelope"),
            FileFormat::Tsv => write!(f, "tsv"),
            FileFormat::Csv => write!(f, "csv"),
        }
    }
}

// ============================================================================
// Log Tag
// ============================================================================

/// Suffix appended to diagnostic log lines so several sinks can share a log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogTag(Option<String>);

impl LogTag {
    /// Create a tag; empty strings behave like no tag
    pub fn new(suffix: Option<String>) -> Self {
        Self(suffix.filter(|s| !s.is_empty()))
    }

    /// Append the tag to a message
    pub fn format(&self, message: impl std::fmt::Display) -> String {
        match &self.0 {
            Some(suffix) => format!("{message} {suffix}"),
            None => message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_format_deserialize() {
        let f: FileFormat = serde_json::from_str("\"envelope\"").unwrap();
        assert_eq!(f, FileFormat::Envelope);
        assert!(serde_json::from_str::<FileFormat>("\"parquet\"").is_err());
    }

    #[test]
    fn test_file_format_from_str() {
        assert_eq!("tsv".parse::<FileFormat>().unwrap(), FileFormat::Tsv);
        let err = "parquet".parse::<FileFormat>().unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
        assert!(err.to_string().contains("parquet"));
    }

    #[test]
    fn test_file_format_delimiters() {
        assert_eq!(FileFormat::Json.default_delimiter(), '\t');
        assert_eq!(FileFormat::Tsv.default_delimiter(), '\t');
        assert_eq!(FileFormat::Csv.default_delimiter(), ',');
    }

    #[test]
    fn test_log_tag() {
        let tag = LogTag::new(Some("[sink=web]".to_string()));
        assert_eq!(tag.format("upload done"), "upload done [sink=web]");

        let tag = LogTag::new(Some(String::new()));
        assert_eq!(tag.format("upload done"), "upload done");
        assert_eq!(LogTag::default().format(42), "42");
    }
}
