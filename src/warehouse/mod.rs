//! Warehouse module
//!
//! Bulk-loads staged objects with `COPY` and reads table columns from the
//! catalog.
//!
//! # Overview
//!
//! - `CopyTemplate` - renders the COPY statement (and a redacted copy for logs)
//! - `WarehouseClient` - executes statements; `PostgresWarehouse` in production
//! - `classify_load_error` - soft (rejected data) vs fatal failures
//! - `WarehouseLoader` - runs COPY and maps the result to a `LoadOutcome`

mod classify;
mod client;
mod command;
mod loader;
mod types;

pub use classify::classify_load_error;
pub use client::{PostgresWarehouse, WarehouseClient};
pub use command::{CopyTemplate, REDACTED};
pub use loader::WarehouseLoader;
pub use types::{Credentials, LoadErrorClass, LoadFailure, LoadOutcome};

#[cfg(test)]
mod tests;
