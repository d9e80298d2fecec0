//! Table schema module
//!
//! Resolves the ordered column list of the target table from the
//! warehouse catalog.
//!
//! # Overview
//!
//! - `TableIdentifier` - `schema.table` or bare `table`
//! - `TableSchema` - ordered column names, minus an optional excluded column
//! - `ColumnCatalog` - where columns come from (the warehouse in production)
//! - `SchemaResolver` - lazily fetches and caches schemas per table

mod resolver;
mod types;

pub use resolver::{ColumnCatalog, SchemaResolver};
pub use types::{TableIdentifier, TableSchema};
