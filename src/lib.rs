// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Solidafy Redshift
//!
//! Chunked writer that lands log records in Redshift through S3 staging.
//!
//! ## Features
//!
//! - **Schema-aware rows**: Columns are read from the live table and every
//!   record is written in column order
//! - **Safe escaping**: Backslash, tab, newline and the delimiter are escaped
//!   so COPY ... ESCAPE restores the original values
//! - **Gzip staging**: One compressed file per chunk under a unique S3 key
//! - **Classified loads**: Rejected data is logged and skipped, anything else
//!   fails the chunk so the host can retry
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use solidafy_redshift::{Chunk, RedshiftSink, SinkConfig};
//!
//! #[tokio::main]
//! async fn main() -> solidafy_redshift::Result<()> {
//!     let sink = RedshiftSink::from_config(SinkConfig::from_file("sink.yaml")?)?;
//!
//!     let mut buffer = sink.chunk_buffer();
//!     for record in records {
//!         buffer.push(&record)?;
//!     }
//!
//!     let outcome = sink.write(&buffer.take()).await?;
//!     println!("{outcome:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          RedshiftSink                           │
//! │        format(record) → bytes      write(chunk) → WriteOutcome  │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴─┬────────────────┬───────────────┐
//! │    Schema    │   ChunkWriter   │    Staging     │   Warehouse   │
//! ├──────────────┼─────────────────┼────────────────┼───────────────┤
//! │ Catalog      │ Decode          │ Key template   │ COPY template │
//! │ Cache        │ Serialize       │ Probe + put    │ Execute       │
//! │ Exclusion    │ Gzip temp file  │ Canned ACL     │ Classify      │
//! └──────────────┴─────────────────┴────────────────┴───────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Template interpolation
pub mod template;

/// Sink configuration
pub mod config;

/// Chunk framing
pub mod chunk;

/// Table schema resolution
pub mod schema;

/// Record decoders for structured chunks
pub mod decode;

/// Row serialization and escaping
pub mod serialize;

/// Chunk to gzip staging file
pub mod writer;

/// Object storage staging
pub mod staging;

/// COPY execution and catalog access
pub mod warehouse;

/// Sink entry point
pub mod sink;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use chunk::{format_record, Chunk, ChunkBuffer};
pub use config::SinkConfig;
pub use sink::{RedshiftSink, WriteOutcome};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
