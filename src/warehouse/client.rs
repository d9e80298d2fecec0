//! Warehouse connections over the PostgreSQL wire protocol

use super::types::LoadFailure;
use crate::config::WarehouseConfig;
use crate::error::{Error, Result};
use crate::schema::{ColumnCatalog, TableIdentifier};
use async_trait::async_trait;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, warn};

const COLUMNS_IN_SCHEMA_SQL: &str = "SELECT column_name::varchar FROM information_schema.columns \
     WHERE table_schema = $1::varchar AND table_name = $2::varchar ORDER BY ordinal_position";

const COLUMNS_SQL: &str = "SELECT column_name::varchar FROM information_schema.columns \
     WHERE table_name = $1::varchar ORDER BY ordinal_position";

/// Executes statements against the warehouse
#[async_trait]
pub trait WarehouseClient: Send + Sync {
    /// Run one statement to completion
    async fn execute(&self, sql: &str) -> std::result::Result<(), LoadFailure>;
}

/// Redshift (or PostgreSQL) reached with `tokio-postgres`
///
/// Every call opens its own connection and closes it before returning.
pub struct PostgresWarehouse {
    config: tokio_postgres::Config,
}

impl PostgresWarehouse {
    /// Create a client for the configured warehouse
    pub fn new(warehouse: &WarehouseConfig) -> Self {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&warehouse.host)
            .port(warehouse.port)
            .dbname(&warehouse.database)
            .user(&warehouse.user)
            .application_name(crate::NAME)
            .connect_timeout(Duration::from_secs(warehouse.connect_timeout_secs));
        if let Some(password) = &warehouse.password {
            config.password(password);
        }
        Self { config }
    }

    /// Create a client from a connection string (`postgres://...` or `key=value`)
    pub fn from_url(url: &str) -> Result<Self> {
        let config = url
            .parse::<tokio_postgres::Config>()
            .map_err(|e| Error::invalid_value("warehouse url", e.to_string()))?;
        Ok(Self { config })
    }

    /// Open a connection and run a trivial query
    pub async fn ping(&self) -> Result<()> {
        let (client, handle) = self
            .connect()
            .await
            .map_err(|e| Error::connection(e.to_string()))?;
        let result = client.simple_query("SELECT 1").await;
        close(client, handle).await;
        result.map_err(|e| Error::connection(e.to_string()))?;
        Ok(())
    }

    async fn connect(
        &self,
    ) -> std::result::Result<(Client, JoinHandle<()>), tokio_postgres::Error> {
        let (client, connection) = self.config.connect(NoTls).await?;
        let handle = tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "warehouse connection error");
            }
        });
        debug!("warehouse connection opened");
        Ok((client, handle))
    }
}

/// Drop the client and wait for the connection task to finish
async fn close(client: Client, handle: JoinHandle<()>) {
    drop(client);
    if let Err(e) = handle.await {
        warn!(error = %e, "warehouse connection task failed");
    }
    debug!("warehouse connection closed");
}

#[async_trait]
impl WarehouseClient for PostgresWarehouse {
    async fn execute(&self, sql: &str) -> std::result::Result<(), LoadFailure> {
        let (client, handle) = self.connect().await?;
        let result = client.batch_execute(sql).await;
        close(client, handle).await;
        result.map_err(LoadFailure::from)
    }
}

#[async_trait]
impl ColumnCatalog for PostgresWarehouse {
    async fn fetch_columns(&self, table: &TableIdentifier) -> Result<Vec<String>> {
        let fail = |e: tokio_postgres::Error| Error::schema_fetch(table.to_string(), e.to_string());

        let (client, handle) = self.connect().await.map_err(fail)?;
        let rows = match &table.schema {
            Some(schema) => {
                client
                    .query(COLUMNS_IN_SCHEMA_SQL, &[schema, &table.table])
                    .await
            }
            None => client.query(COLUMNS_SQL, &[&table.table]).await,
        };
        close(client, handle).await;

        let rows = rows.map_err(fail)?;
        rows.iter()
            .map(|row| row.try_get::<_, String>(0).map_err(fail))
            .collect()
    }
}
