//! Chunk writer module
//!
//! Turns a chunk into a gzip file ready for staging.
//!
//! # Overview
//!
//! - Structured formats: resolve the table schema once, decode and
//!   serialize each entry, stream non-empty rows into the gzip file.
//! - Flat formats: stream the chunk bytes into the gzip file unchanged.
//!
//! A malformed record is logged and dropped; only I/O failures and
//! schema fetch failures abort the chunk.

mod chunk_writer;
mod types;

pub use chunk_writer::ChunkWriter;
pub use types::{ChunkOutcome, StagedFile};
