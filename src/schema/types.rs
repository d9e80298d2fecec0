//! Schema types

use serde::{Deserialize, Serialize};

/// A table, optionally qualified by schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableIdentifier {
    /// Schema name
    pub schema: Option<String>,
    /// Table name
    pub table: String,
}

impl TableIdentifier {
    /// Create an identifier; an empty schema counts as none
    pub fn new(schema: Option<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.filter(|s| !s.is_empty()),
            table: table.into(),
        }
    }

    /// Create an unqualified identifier
    pub fn table(table: impl Into<String>) -> Self {
        Self::new(None, table)
    }
}

impl std::fmt::Display for TableIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.table),
            None => write!(f, "{}", self.table),
        }
    }
}

/// Ordered column names of a live warehouse table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<String>,
}

impl TableSchema {
    /// Create a schema from columns in physical order
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// Drop a column by name, if present
    #[must_use]
    pub fn without_column(mut self, excluded: Option<&str>) -> Self {
        if let Some(excluded) = excluded {
            self.columns.retain(|c| c != excluded);
        }
        self
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no visible columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl From<Vec<&str>> for TableSchema {
    fn from(columns: Vec<&str>) -> Self {
        Self::new(columns.into_iter().map(String::from).collect())
    }
}
