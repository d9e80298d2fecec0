//! Staging module
//!
//! Uploads compressed chunk files to object storage for COPY.
//!
//! # Overview
//!
//! - `KeyTemplate` - `<base_path><timestamp>_<NN>.gz` key layout
//! - `StagingUploader` - finds a free key and uploads there
//! - `build_store` - S3 (with canned ACL) or local directory store

mod key;
mod store;
mod uploader;

pub use key::{validate_pattern, KeyTemplate};
pub use store::build_store;
pub use uploader::{StagedObject, StagingUploader, MAX_KEY_PROBES};
