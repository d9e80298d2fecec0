//! COPY execution and outcome handling

use super::classify::classify_load_error;
use super::client::WarehouseClient;
use super::command::CopyTemplate;
use super::types::{LoadErrorClass, LoadOutcome};
use crate::error::{Error, Result};
use crate::types::LogTag;
use std::sync::Arc;
use tracing::{error, info};

/// Loads staged objects into the target table
pub struct WarehouseLoader {
    /// Connection factory
    client: Arc<dyn WarehouseClient>,
    /// COPY statement template
    template: CopyTemplate,
    /// Suffix for log lines
    log_tag: LogTag,
}

impl WarehouseLoader {
    /// Create a loader
    pub fn new(client: Arc<dyn WarehouseClient>, template: CopyTemplate) -> Self {
        Self {
            client,
            template,
            log_tag: LogTag::default(),
        }
    }

    /// Set the log tag
    #[must_use]
    pub fn with_log_tag(mut self, log_tag: LogTag) -> Self {
        self.log_tag = log_tag;
        self
    }

    /// COPY template in use
    pub fn template(&self) -> &CopyTemplate {
        &self.template
    }

    /// COPY the object at `key` into the table
    ///
    /// Rejected data is logged and reported as [`LoadOutcome::SoftSkip`];
    /// every other failure is returned as [`Error::LoadFatal`].
    pub async fn load(&self, key: &str) -> Result<LoadOutcome> {
        let sql = self.template.render(key);
        let redacted = self.template.render_redacted(key);

        match self.client.execute(&sql).await {
            Ok(()) => {
                info!(
                    "{}",
                    self.log_tag.format(format!(
                        "completed copying to redshift. s3_uri={}",
                        self.template.uri(key)
                    ))
                );
                Ok(LoadOutcome::Loaded)
            }
            Err(failure) => match classify_load_error(&failure) {
                LoadErrorClass::Soft => {
                    let rejected = Error::LoadData {
                        table: self.template.table().to_string(),
                        message: failure.to_string(),
                    };
                    error!(
                        "{}",
                        self.log_tag.format(format!("{rejected}. sql={redacted}"))
                    );
                    Ok(LoadOutcome::SoftSkip)
                }
                LoadErrorClass::Fatal => {
                    Err(Error::load_fatal(format!("{failure}. sql={redacted}")))
                }
            },
        }
    }
}
