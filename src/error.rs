//! Error types for Solidafy Redshift
//!
//! This module defines the error hierarchy for the whole write pipeline.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Errors fall into two groups. Fatal errors propagate to the host, which
//! retries the whole chunk. Soft errors (a single bad record, a COPY that
//! rejected the data) are logged and never cause a retry.

use thiserror::Error;

/// The main error type for Solidafy Redshift
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Undefined variable in template: {variable}")]
    UndefinedVariable { variable: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Schema Errors
    // ============================================================================
    #[error("Failed to fetch columns for table '{table}': {message}")]
    SchemaFetch { table: String, message: String },

    #[error("No columns visible for table '{table}'")]
    EmptySchema { table: String },

    // ============================================================================
    // Record Errors
    // ============================================================================
    #[error("Failed to decode record: {message}")]
    RecordDecode { message: String },

    #[error("Failed to serialize record: {message}")]
    RecordSerialize { message: String },

    // ============================================================================
    // Staging Errors
    // ============================================================================
    #[error("Upload to '{key}' failed: {message}")]
    Upload { key: String, message: String },

    // ============================================================================
    // Warehouse Errors
    // ============================================================================
    #[error("Warehouse connection failed: {message}")]
    Connection { message: String },

    #[error("Load into table '{table}' rejected data: {message}")]
    LoadData { table: String, message: String },

    #[error("Load failed: {message}")]
    LoadFatal { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an undefined variable error
    pub fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// Create a schema fetch error
    pub fn schema_fetch(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaFetch {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a record decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::RecordDecode {
            message: message.into(),
        }
    }

    /// Create a record serialize error
    pub fn serialize(message: impl Into<String>) -> Self {
        Self::RecordSerialize {
            message: message.into(),
        }
    }

    /// Create an upload error
    pub fn upload(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upload {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a fatal load error
    pub fn load_fatal(message: impl Into<String>) -> Self {
        Self::LoadFatal {
            message: message.into(),
        }
    }

    /// Check if this error only affects a single record
    ///
    /// Record-level errors are logged and the record is dropped; the rest
    /// of the chunk is still written.
    pub fn is_record_level(&self) -> bool {
        matches!(self, Error::RecordDecode { .. } | Error::RecordSerialize { .. })
    }

    /// Check if this error should fail the chunk so the host retries it
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::EmptySchema { .. }
                | Error::RecordDecode { .. }
                | Error::RecordSerialize { .. }
                | Error::LoadData { .. }
        )
    }
}

/// Result type alias for Solidafy Redshift
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
