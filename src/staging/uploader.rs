//! Staging uploads with collision-free keys

use super::key::KeyTemplate;
use crate::error::{Error, Result};
use crate::types::LogTag;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutMode, PutOptions, PutPayload};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Upper bound on suffixes tried for one upload
pub const MAX_KEY_PROBES: u32 = 1000;

/// An object uploaded for loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedObject {
    /// Key within the bucket
    pub key: String,
    /// `s3://bucket/key`, as referenced by COPY
    pub uri: String,
    /// Size in bytes
    pub size: usize,
}

/// Uploads staging files under keys nobody else has used
///
/// Without `conditional_put` the key is picked by probing for existence and
/// then writing, which two processes sharing a prefix can race on. With it,
/// writes are create-only and a lost race moves on to the next suffix.
pub struct StagingUploader {
    /// Object store (stateless, shared)
    store: Arc<dyn ObjectStore>,
    /// Bucket name, for URIs
    bucket: String,
    /// Key layout
    template: KeyTemplate,
    /// Use create-only puts
    conditional_put: bool,
    /// Clock for the timestamp part of keys
    now: fn() -> DateTime<Utc>,
    /// Suffix for log lines
    log_tag: LogTag,
}

impl StagingUploader {
    /// Create an uploader
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        template: KeyTemplate,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            template,
            conditional_put: false,
            now: Utc::now,
            log_tag: LogTag::default(),
        }
    }

    /// Enable create-only puts
    #[must_use]
    pub fn with_conditional_put(mut self, enabled: bool) -> Self {
        self.conditional_put = enabled;
        self
    }

    /// Replace the clock
    #[must_use]
    pub fn with_clock(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Set the log tag
    #[must_use]
    pub fn with_log_tag(mut self, log_tag: LogTag) -> Self {
        self.log_tag = log_tag;
        self
    }

    /// `s3://bucket/key`
    pub fn uri(&self, key: &str) -> String {
        format!("s3://{}/{key}", self.bucket)
    }

    /// Upload a local file
    pub async fn upload_file(&self, path: &Path) -> Result<StagedObject> {
        let data = tokio::fs::read(path).await?;
        self.upload(Bytes::from(data)).await
    }

    /// Upload bytes under the first free key
    pub async fn upload(&self, data: Bytes) -> Result<StagedObject> {
        let timestamp = self.template.timestamp((self.now)())?;

        for suffix in 0..MAX_KEY_PROBES {
            let key = self.template.key(&timestamp, suffix);
            let path = ObjectPath::parse(&key)
                .map_err(|e| Error::upload(&key, format!("invalid object key: {e}")))?;

            if self.exists(&path).await? {
                debug!(key = %path, "staging key taken");
                continue;
            }

            if self.put(&path, data.clone()).await? {
                let key = path.to_string();
                let uri = self.uri(&key);
                info!(
                    size = data.len(),
                    "{}",
                    self.log_tag.format(format!("uploaded staging file. s3_uri={uri}"))
                );
                return Ok(StagedObject {
                    key,
                    uri,
                    size: data.len(),
                });
            }
            debug!(key = %path, "staging key created concurrently");
        }

        Err(Error::upload(
            self.template.key(&timestamp, MAX_KEY_PROBES),
            format!("no free key after {MAX_KEY_PROBES} attempts"),
        ))
    }

    async fn exists(&self, path: &ObjectPath) -> Result<bool> {
        match self.store.head(path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(Error::upload(path.to_string(), format!("existence check failed: {e}"))),
        }
    }

    /// Returns false when a create-only put lost the key to another writer
    pub(crate) async fn put(&self, path: &ObjectPath, data: Bytes) -> Result<bool> {
        let opts = PutOptions {
            mode: if self.conditional_put {
                PutMode::Create
            } else {
                PutMode::Overwrite
            },
            ..Default::default()
        };

        match self.store.put_opts(path, PutPayload::from(data), opts).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::AlreadyExists { .. }) if self.conditional_put => Ok(false),
            Err(e) => Err(Error::upload(path.to_string(), e.to_string())),
        }
    }
}
