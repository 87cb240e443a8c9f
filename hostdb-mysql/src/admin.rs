//! The administrative engine handle.
//!
//! Only provisioning DDL and size accounting run here; tenant SQL goes
//! through [`crate::tenant::TenantHandle`] instead.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::MysqlConfig;
use crate::ddl;
use crate::error::MysqlResult;
use crate::pool::{MysqlPool, PoolConfig};

const SIZE_QUERY: &str = "SELECT ROUND(COALESCE(SUM(data_length + index_length), 0) / 1048576, 2) \
     FROM information_schema.tables WHERE table_schema = ?";

/// Capability to run privileged statements against the engine.
#[async_trait]
pub trait AdminEngine: Send + Sync {
    /// Execute one DDL statement.
    async fn execute(&self, statement: &str) -> MysqlResult<()>;

    /// Data plus index size of a schema in megabytes.
    async fn database_size_mb(&self, db_name: &str) -> MysqlResult<f64>;

    /// Release engine resources. The default does nothing.
    async fn close(&self) {}
}

/// [`AdminEngine`] backed by a small MySQL pool logged in as the operator.
#[derive(Clone)]
pub struct MysqlAdmin {
    pool: MysqlPool,
}

impl MysqlAdmin {
    /// Wrap an existing pool.
    pub fn new(pool: MysqlPool) -> Self {
        Self { pool }
    }

    /// Build the administrative pool from a configuration.
    pub fn connect(config: MysqlConfig) -> MysqlResult<Self> {
        let pool = MysqlPool::with_pool_config(config, PoolConfig::admin())?;
        Ok(Self::new(pool))
    }

    /// Verify the operator credentials.
    pub async fn ping(&self) -> MysqlResult<()> {
        self.pool.ping().await
    }
}

#[async_trait]
impl AdminEngine for MysqlAdmin {
    async fn execute(&self, statement: &str) -> MysqlResult<()> {
        debug!(statement = %ddl::redact(statement), "Executing administrative statement");
        let mut conn = self.pool.get().await?;
        conn.execute(statement).await?;
        Ok(())
    }

    async fn database_size_mb(&self, db_name: &str) -> MysqlResult<f64> {
        let mut conn = self.pool.get().await?;
        conn.query_scalar::<f64, _>(SIZE_QUERY, (db_name,))
            .await
    }

    async fn close(&self) {
        if let Err(e) = self.pool.clone().disconnect().await {
            warn!(error = %e, "Failed to close administrative pool cleanly");
        }
    }
}
