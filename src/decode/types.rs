//! Decoder types and traits
//!
//! Defines the core decoder abstraction.

use crate::error::Result;
use crate::types::Record;

/// Trait for decoding one framed chunk entry into a record
///
/// A decode failure affects only that entry; callers log it and move on.
pub trait RecordDecoder: Send + Sync {
    /// Decode a single entry (one line of a structured chunk)
    fn decode(&self, entry: &[u8]) -> Result<Record>;
}
