//! Configuration types for the Redshift sink
//!
//! This module contains all the configuration structures used to define
//! a sink in YAML (or JSON) format, plus loading and validation.

use crate::error::{Error, Result};
use crate::schema::TableIdentifier;
use crate::staging::KeyTemplate;
use crate::template::{self, TemplateContext};
use crate::types::{FileFormat, LogTag};
use chrono::Utc;
use object_store::path::Path as ObjectPath;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default Redshift port
pub const DEFAULT_PORT: u16 = 5439;

/// Default object key layout, partitioned by date and hour
pub const DEFAULT_TIMESTAMP_KEY_FORMAT: &str = "year=%Y/month=%m/day=%d/hour=%H/%Y%m%d-%H%M";

/// Default COPY options: truncate values wider than their column
pub const DEFAULT_BASE_OPTIONS: &str = "TRUNCATECOLUMNS";

/// Default canned ACL for objects in a shared staging bucket
pub const DEFAULT_ACL: &str = "bucket-owner-full-control";

// ============================================================================
// Top-Level Sink Config
// ============================================================================

/// Complete sink configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Warehouse connection and target table
    pub warehouse: WarehouseConfig,

    /// Staging bucket
    pub storage: StorageConfig,

    /// Record format
    #[serde(default)]
    pub format: FormatConfig,

    /// COPY command options
    #[serde(default)]
    pub load: LoadConfig,

    /// Staging object naming
    #[serde(default)]
    pub staging: StagingConfig,

    /// Suffix appended to diagnostic log lines
    #[serde(default)]
    pub log_suffix: Option<String>,
}

// ============================================================================
// Warehouse
// ============================================================================

/// Warehouse connection parameters and target table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Cluster endpoint host
    pub host: String,

    /// Port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name
    pub database: String,

    /// User name
    pub user: String,

    /// Password
    #[serde(default)]
    pub password: Option<String>,

    /// Schema of the target table
    #[serde(default)]
    pub schema: Option<String>,

    /// Target table
    pub table: String,

    /// Column to leave out of every row (e.g. an identity column)
    #[serde(default)]
    pub exclude_column: Option<String>,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_connect_timeout() -> u64 {
    30
}

impl WarehouseConfig {
    /// Identifier of the target table
    pub fn table_identifier(&self) -> TableIdentifier {
        TableIdentifier::new(self.schema.clone(), self.table.clone())
    }
}

// ============================================================================
// Storage
// ============================================================================

/// Object storage used for staging files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket name
    pub bucket: String,

    /// AWS region
    #[serde(default)]
    pub region: Option<String>,

    /// Custom S3-compatible endpoint
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Key prefix for staged files (e.g. `logs/`)
    #[serde(default)]
    pub base_path: String,

    /// Access key id, also used in the COPY credentials
    #[serde(default)]
    pub access_key_id: Option<String>,

    /// Secret access key, also used in the COPY credentials
    #[serde(default)]
    pub secret_access_key: Option<String>,

    /// Canned ACL sent with every upload
    #[serde(default = "default_acl")]
    pub acl: String,

    /// Use create-only puts so concurrent writers cannot overwrite a key
    #[serde(default)]
    pub conditional_put: bool,

    /// Stage into a local directory instead of S3
    #[serde(default)]
    pub local_root: Option<String>,
}

fn default_acl() -> String {
    DEFAULT_ACL.to_string()
}

// ============================================================================
// Format
// ============================================================================

/// How records are framed and delimited
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Record format
    #[serde(default)]
    pub file_type: FileFormat,

    /// Field delimiter override
    #[serde(default)]
    pub delimiter: Option<String>,

    /// Record field that carries the row source
    #[serde(default = "default_log_field")]
    pub log_field: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            file_type: FileFormat::default(),
            delimiter: None,
            log_field: default_log_field(),
        }
    }
}

fn default_log_field() -> String {
    "log".to_string()
}

impl FormatConfig {
    /// The effective delimiter: the override if set, else the format's default
    pub fn delimiter(&self) -> Result<char> {
        match self.delimiter.as_deref() {
            None => Ok(self.file_type.default_delimiter()),
            Some("\\t") => Ok('\t'),
            Some(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(Error::invalid_value(
                        "format.delimiter",
                        format!("expected a single character, got '{s}'"),
                    )),
                }
            }
        }
    }
}

// ============================================================================
// Load
// ============================================================================

/// Options for the COPY command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    /// IAM role ARN; when set, used instead of the access key pair
    #[serde(default)]
    pub iam_role: Option<String>,

    /// DATEFORMAT
    #[serde(default = "default_auto")]
    pub date_format: String,

    /// TIMEFORMAT
    #[serde(default = "default_auto")]
    pub time_format: String,

    /// Options always appended after `GZIP ESCAPE`
    #[serde(default = "default_base_options")]
    pub base_options: String,

    /// User-supplied options appended after the base options
    #[serde(default)]
    pub extra_options: String,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            iam_role: None,
            date_format: default_auto(),
            time_format: default_auto(),
            base_options: default_base_options(),
            extra_options: String::new(),
        }
    }
}

fn default_auto() -> String {
    "auto".to_string()
}

fn default_base_options() -> String {
    DEFAULT_BASE_OPTIONS.to_string()
}

// ============================================================================
// Staging
// ============================================================================

/// Staging object naming
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    /// strftime pattern for the timestamp part of the key
    #[serde(default = "default_timestamp_key_format")]
    pub timestamp_key_format: String,

    /// Format the timestamp in UTC rather than local time
    #[serde(default = "default_true")]
    pub utc: bool,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            timestamp_key_format: default_timestamp_key_format(),
            utc: true,
        }
    }
}

fn default_timestamp_key_format() -> String {
    DEFAULT_TIMESTAMP_KEY_FORMAT.to_string()
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Loading & Validation
// ============================================================================

impl SinkConfig {
    /// Load a config file, interpolating `{{ env.NAME }}` from the environment
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        Self::from_str_with(&contents, is_json, &TemplateContext::new())
    }

    /// Parse a YAML config string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::from_str_with(yaml, false, &TemplateContext::new())
    }

    /// Parse a config string with an explicit template context
    pub fn from_str_with(contents: &str, is_json: bool, ctx: &TemplateContext) -> Result<Self> {
        let rendered = if template::has_templates(contents) {
            template::render(contents, ctx)?
        } else {
            contents.to_string()
        };
        let config: SinkConfig = if is_json {
            let value: serde_json::Value = serde_json::from_str(&rendered)?;
            check_file_type(
                value
                    .get("format")
                    .and_then(|f| f.get("file_type"))
                    .and_then(serde_json::Value::as_str),
            )?;
            serde_json::from_value(value)?
        } else {
            let value: serde_yaml::Value = serde_yaml::from_str(&rendered)?;
            check_file_type(
                value
                    .get("format")
                    .and_then(|f| f.get("file_type"))
                    .and_then(serde_yaml::Value::as_str),
            )?;
            serde_yaml::from_value(value)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configs the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        require_non_empty("warehouse.host", &self.warehouse.host)?;
        require_non_empty("warehouse.database", &self.warehouse.database)?;
        require_non_empty("warehouse.user", &self.warehouse.user)?;
        require_non_empty("warehouse.table", &self.warehouse.table)?;
        require_non_empty("storage.bucket", &self.storage.bucket)?;
        require_non_empty("format.log_field", &self.format.log_field)?;
        require_non_empty(
            "staging.timestamp_key_format",
            &self.staging.timestamp_key_format,
        )?;
        self.validate_key_layout()?;

        let delimiter = self.format.delimiter()?;
        if matches!(delimiter, '\n' | '\\') {
            return Err(Error::invalid_value(
                "format.delimiter",
                "newline and backslash cannot be used as delimiters",
            ));
        }
        if !delimiter.is_ascii() {
            return Err(Error::invalid_value(
                "format.delimiter",
                format!("COPY needs a single-byte delimiter, got '{delimiter}'"),
            ));
        }

        if self.load.iam_role.is_none() {
            let has_keys = self.storage.access_key_id.is_some()
                && self.storage.secret_access_key.is_some();
            if !has_keys {
                return Err(Error::config(
                    "COPY needs credentials: set load.iam_role or \
                     storage.access_key_id and storage.secret_access_key",
                ));
            }
        }

        Ok(())
    }

    /// Check that staged keys will be valid object paths
    fn validate_key_layout(&self) -> Result<()> {
        let template = KeyTemplate::new(
            self.storage.base_path.clone(),
            self.staging.timestamp_key_format.clone(),
            self.staging.utc,
        )?;

        let prefix = template.key("", 0);
        if let Err(e) = ObjectPath::parse(&prefix) {
            return Err(Error::invalid_value(
                "storage.base_path",
                format!("'{}' is not a valid key prefix: {e}", self.storage.base_path),
            ));
        }

        let sample = template.key(&template.timestamp(Utc::now())?, 0);
        if let Err(e) = ObjectPath::parse(&sample) {
            return Err(Error::invalid_value(
                "staging.timestamp_key_format",
                format!("produces invalid key '{sample}': {e}"),
            ));
        }
        Ok(())
    }

    /// Log tag built from `log_suffix`
    pub fn log_tag(&self) -> LogTag {
        LogTag::new(self.log_suffix.clone())
    }
}

/// Reject an unsupported `format.file_type` with a config error
fn check_file_type(file_type: Option<&str>) -> Result<()> {
    match file_type {
        Some(name) => name.parse::<FileFormat>().map(|_| ()),
        None => Ok(()),
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::missing_field(field))
    } else {
        Ok(())
    }
}
