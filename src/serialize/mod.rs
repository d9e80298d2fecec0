//! Row serialization module
//!
//! Converts decoded records into delimited text rows for COPY.
//!
//! # Overview
//!
//! - `RecordSerializer` - one row per record, fields in schema order
//! - `escape_with` / `unescape` - backslash escaping understood by `COPY ... ESCAPE`
//!
//! Nested objects and arrays are stored as compact JSON in a single cell.

mod escape;
mod row;

pub use escape::{escape, escape_with, split_escaped, unescape};
pub use row::RecordSerializer;
