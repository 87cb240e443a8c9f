//! Tenant-scoped engine handles.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::MysqlConfig;
use crate::error::MysqlResult;
use crate::pool::{MysqlPool, PoolConfig};
use crate::types::QueryOutput;

/// Login material for one tenant account.
#[derive(Clone, PartialEq, Eq)]
pub struct TenantCredentials {
    /// Engine account name; also the pool key.
    pub db_user: String,
    /// Schema the account is granted on.
    pub db_name: String,
    password: String,
}

impl TenantCredentials {
    /// Bundle an account, schema and secret.
    pub fn new(
        db_user: impl Into<String>,
        db_name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            db_user: db_user.into(),
            db_name: db_name.into(),
            password: password.into(),
        }
    }

    /// The secret.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for TenantCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantCredentials")
            .field("db_user", &self.db_user)
            .field("db_name", &self.db_name)
            .field("password", &"***")
            .finish()
    }
}

/// A live, tenant-authenticated handle. Cheap to share.
#[async_trait]
pub trait TenantHandle: Send + Sync {
    /// Lightweight liveness probe.
    async fn ping(&self) -> MysqlResult<()>;

    /// Run a statement and buffer its result set.
    async fn fetch(&self, sql: &str) -> MysqlResult<QueryOutput>;

    /// Run a statement and report the affected row count.
    async fn execute(&self, sql: &str) -> MysqlResult<u64>;

    /// Release the handle's connections.
    async fn close(&self);
}

/// Opens tenant handles.
#[async_trait]
pub trait HandleFactory: Send + Sync {
    /// Open a handle for the credentials. Opening does not have to connect;
    /// callers probe with [`TenantHandle::ping`].
    async fn open(&self, credentials: &TenantCredentials) -> MysqlResult<Arc<dyn TenantHandle>>;
}

/// [`TenantHandle`] over a bounded MySQL pool.
pub struct MysqlTenantHandle {
    pool: MysqlPool,
}

impl MysqlTenantHandle {
    /// Wrap a pool.
    pub fn new(pool: MysqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantHandle for MysqlTenantHandle {
    async fn ping(&self) -> MysqlResult<()> {
        self.pool.ping().await
    }

    async fn fetch(&self, sql: &str) -> MysqlResult<QueryOutput> {
        let mut conn = self.pool.get().await?;
        conn.query_table(sql).await
    }

    async fn execute(&self, sql: &str) -> MysqlResult<u64> {
        let mut conn = self.pool.get().await?;
        conn.execute(sql).await
    }

    async fn close(&self) {
        let user = self.pool.config().username.clone().unwrap_or_default();
        if let Err(e) = self.pool.clone().disconnect().await {
            warn!(db_user = %user, error = %e, "Failed to close tenant pool cleanly");
        }
    }
}

/// Opens [`MysqlTenantHandle`]s against the tenant endpoint.
#[derive(Debug, Clone)]
pub struct MysqlHandleFactory {
    endpoint: MysqlConfig,
    pool_config: PoolConfig,
}

impl MysqlHandleFactory {
    /// `endpoint` supplies host, port and transport settings; credentials
    /// in it are ignored.
    pub fn new(endpoint: MysqlConfig, pool_config: PoolConfig) -> Self {
        Self {
            endpoint,
            pool_config,
        }
    }

    /// The per-tenant pool limits.
    pub fn pool_config(&self) -> &PoolConfig {
        &self.pool_config
    }
}

#[async_trait]
impl HandleFactory for MysqlHandleFactory {
    async fn open(&self, credentials: &TenantCredentials) -> MysqlResult<Arc<dyn TenantHandle>> {
        debug!(
            db_user = %credentials.db_user,
            db_name = %credentials.db_name,
            "Opening tenant pool"
        );
        let config = self.endpoint.for_tenant(
            credentials.db_user.as_str(),
            credentials.password(),
            credentials.db_name.as_str(),
        );
        let pool = MysqlPool::with_pool_config(config, self.pool_config.clone())?;
        Ok(Arc::new(MysqlTenantHandle::new(pool)))
    }
}
