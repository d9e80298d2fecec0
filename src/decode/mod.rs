//! Record decoder module
//!
//! Supports: JSON-in-field, envelope
//!
//! # Overview
//!
//! Structured chunks carry one JSON document per line. A decoder turns
//! one such line into the record that gets serialized against the table
//! schema. Flat formats (TSV/CSV) have no decoder; their bytes are staged
//! as they are.

mod decoders;
mod types;

pub use decoders::{decoder_for, EnvelopeDecoder, JsonFieldDecoder};
pub use types::RecordDecoder;
