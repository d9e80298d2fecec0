//! Column resolution with a per-resolver cache

use super::types::{TableIdentifier, TableSchema};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Source of table column definitions
#[async_trait]
pub trait ColumnCatalog: Send + Sync {
    /// Column names of the table ordered by physical position
    ///
    /// A table that does not exist yields an empty list, not an error.
    async fn fetch_columns(&self, table: &TableIdentifier) -> Result<Vec<String>>;
}

/// Resolves and caches the column list of target tables
///
/// Entries live for the resolver's lifetime; a table altered after the
/// first fetch is not noticed until [`SchemaResolver::invalidate`] or a
/// restart. Concurrent misses may both hit the catalog; the last write wins.
pub struct SchemaResolver {
    /// Catalog to query on a miss
    catalog: Arc<dyn ColumnCatalog>,
    /// Column removed from every fetched schema
    exclude_column: Option<String>,
    /// Cached schemas
    cache: RwLock<HashMap<TableIdentifier, Arc<TableSchema>>>,
}

impl SchemaResolver {
    /// Create a resolver over a catalog
    pub fn new(catalog: Arc<dyn ColumnCatalog>) -> Self {
        Self {
            catalog,
            exclude_column: None,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Leave a column out of every resolved schema
    #[must_use]
    pub fn with_excluded_column(mut self, column: Option<String>) -> Self {
        self.exclude_column = column.filter(|c| !c.is_empty());
        self
    }

    /// Resolve the columns of `table`
    ///
    /// Fails with [`Error::SchemaFetch`] when the catalog query fails. An empty
    /// schema is returned as-is (and not cached) so the caller can decide.
    pub async fn resolve(&self, table: &TableIdentifier) -> Result<Arc<TableSchema>> {
        if let Some(schema) = self.cache.read().await.get(table) {
            return Ok(Arc::clone(schema));
        }

        let columns = self.catalog.fetch_columns(table).await.map_err(|e| match e {
            Error::SchemaFetch { .. } => e,
            other => Error::schema_fetch(table.to_string(), other.to_string()),
        })?;

        let schema = TableSchema::new(columns).without_column(self.exclude_column.as_deref());
        if schema.is_empty() {
            warn!(table = %table, "no columns visible for table");
            return Ok(Arc::new(schema));
        }

        debug!(table = %table, columns = schema.len(), "resolved table columns");
        let schema = Arc::new(schema);
        self.cache
            .write()
            .await
            .insert(table.clone(), Arc::clone(&schema));
        Ok(schema)
    }

    /// Forget the cached schema of `table`
    pub async fn invalidate(&self, table: &TableIdentifier) {
        self.cache.write().await.remove(table);
    }

    /// Whether `table` has a cached schema
    pub async fn is_cached(&self, table: &TableIdentifier) -> bool {
        self.cache.read().await.contains_key(table)
    }
}
