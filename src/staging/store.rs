//! Object store construction (S3 or local directory)

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use object_store::aws::{AmazonS3Builder, S3ConditionalPut};
use object_store::local::LocalFileSystem;
use object_store::{ClientOptions, ObjectStore};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;

/// Header carrying the canned ACL on S3 puts
const ACL_HEADER: &str = "x-amz-acl";

/// Build the staging store described by `config`
///
/// - `local_root` set: a local directory, created if missing
/// - otherwise: the S3 bucket, reading unset settings from `AWS_*` env vars
pub fn build_store(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>> {
    match &config.local_root {
        Some(root) => build_local(root),
        None => build_s3(config),
    }
}

/// Local filesystem store rooted at `path`
fn build_local(path: &str) -> Result<Arc<dyn ObjectStore>> {
    let path = path.strip_prefix("file://").unwrap_or(path);

    std::fs::create_dir_all(path)
        .map_err(|e| Error::config(format!("Failed to create directory {path}: {e}")))?;

    let store = LocalFileSystem::new_with_prefix(path)
        .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

    Ok(Arc::new(store))
}

/// S3 (or S3-compatible) store for the configured bucket
fn build_s3(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>> {
    let mut builder = AmazonS3Builder::from_env().with_bucket_name(&config.bucket);

    if let Some(region) = &config.region {
        builder = builder.with_region(region);
    }

    if let Some(endpoint) = &config.endpoint {
        let url = url::Url::parse(endpoint)
            .map_err(|e| Error::invalid_value("storage.endpoint", e.to_string()))?;
        builder = builder
            .with_endpoint(endpoint)
            .with_allow_http(url.scheme() == "http");
    }

    if let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
        builder = builder
            .with_access_key_id(key_id)
            .with_secret_access_key(secret);
    }

    if config.conditional_put {
        builder = builder.with_conditional_put(S3ConditionalPut::ETagMatch);
    }

    builder = builder.with_client_options(client_options(&config.acl)?);

    let store = builder
        .build()
        .map_err(|e| Error::config(format!("Failed to create s3 client: {e}")))?;

    Ok(Arc::new(store))
}

/// Client options sending the canned ACL with every request
fn client_options(acl: &str) -> Result<ClientOptions> {
    Ok(ClientOptions::new().with_default_headers(acl_headers(acl)?))
}

/// Default headers for the canned ACL; empty when no ACL is configured
fn acl_headers(acl: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    if !acl.is_empty() {
        let value = HeaderValue::from_str(acl)
            .map_err(|e| Error::invalid_value("storage.acl", e.to_string()))?;
        headers.insert(HeaderName::from_static(ACL_HEADER), value);
    }
    Ok(headers)
}
