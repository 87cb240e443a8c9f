//! Connection pool for MySQL.
//!
//! One [`MysqlPool`] backs the administrative engine and one more backs
//! each tenant handle. Pools are lazy: no connection is opened until the
//! first [`MysqlPool::get`].

use std::sync::Arc;
use std::time::Duration;

use mysql_async::{Opts, Pool, PoolConstraints, PoolOpts};
use tracing::{debug, info};

use crate::config::MysqlConfig;
use crate::connection::MysqlConnection;
use crate::error::{MysqlError, MysqlResult};

/// A connection pool bound to one account on one endpoint.
#[derive(Clone)]
pub struct MysqlPool {
    inner: Pool,
    config: Arc<MysqlConfig>,
    acquire_timeout: Option<Duration>,
}

impl MysqlPool {
    /// Create a pool with the given limits.
    pub fn with_pool_config(config: MysqlConfig, pool_config: PoolConfig) -> MysqlResult<Self> {
        let opts = config
            .to_opts_builder()
            .pool_opts(pool_config.to_pool_opts()?);

        let acquire_timeout = match (pool_config.connection_timeout, config.connect_timeout) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        info!(
            host = %config.host,
            port = %config.port,
            user = config.username.as_deref().unwrap_or(""),
            max_connections = %pool_config.max_connections,
            "MySQL connection pool created"
        );

        Ok(Self {
            inner: Pool::new(Opts::from(opts)),
            config: Arc::new(config),
            acquire_timeout,
        })
    }

    /// Get a connection from the pool, bounded by the connection timeout.
    pub async fn get(&self) -> MysqlResult<MysqlConnection> {
        debug!(host = %self.config.host, "Acquiring connection from pool");
        let conn = match self.acquire_timeout {
            Some(limit) => tokio::time::timeout(limit, self.inner.get_conn())
                .await
                .map_err(|_| {
                    MysqlError::timeout(format!(
                        "no connection to {}:{} within {:?}",
                        self.config.host, self.config.port, limit
                    ))
                })??,
            None => self.inner.get_conn().await?,
        };
        Ok(MysqlConnection::new(conn))
    }

    /// Check that a connection can be checked out and answers a ping.
    pub async fn ping(&self) -> MysqlResult<()> {
        let mut conn = self.get().await?;
        conn.ping().await
    }

    /// The endpoint and account this pool logs in with.
    pub fn config(&self) -> &MysqlConfig {
        &self.config
    }

    /// Close every connection.
    ///
    /// Waits for checked-out connections to be returned.
    pub async fn disconnect(self) -> MysqlResult<()> {
        self.inner.disconnect().await?;
        info!(host = %self.config.host, "MySQL connection pool closed");
        Ok(())
    }
}

/// Limits for one pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of open connections.
    pub max_connections: usize,
    /// Number of idle connections kept once the idle timeout elapses.
    pub min_connections: usize,
    /// Maximum time to wait for a connection.
    pub connection_timeout: Option<Duration>,
    /// Idle time after which connections beyond `min_connections` are closed.
    pub idle_timeout: Option<Duration>,
    /// Maximum lifetime of a connection.
    pub max_lifetime: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::tenant()
    }
}

impl PoolConfig {
    /// Limits for a single tenant's handle: 5 open, 2 idle, 5 minute lifetime.
    pub fn tenant() -> Self {
        Self {
            max_connections: 5,
            min_connections: 2,
            connection_timeout: Some(Duration::from_secs(10)),
            idle_timeout: Some(Duration::from_secs(60)),
            max_lifetime: Some(Duration::from_secs(300)),
        }
    }

    /// Limits for the operator account. DDL is serialised per request, so a
    /// handful of connections covers concurrent provisioning.
    pub fn admin() -> Self {
        Self {
            max_connections: 4,
            min_connections: 1,
            connection_timeout: Some(Duration::from_secs(30)),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
        }
    }

    /// Translate into driver pool options.
    pub fn to_pool_opts(&self) -> MysqlResult<PoolOpts> {
        if self.max_connections == 0 {
            return Err(MysqlError::config("max_connections must be at least 1"));
        }
        let constraints = PoolConstraints::new(self.min_connections, self.max_connections)
            .ok_or_else(|| {
                MysqlError::config(format!(
                    "min_connections ({}) exceeds max_connections ({})",
                    self.min_connections, self.max_connections
                ))
            })?;

        let mut opts = PoolOpts::new()
            .with_constraints(constraints)
            .with_abs_conn_ttl(self.max_lifetime);
        if let Some(idle) = self.idle_timeout {
            opts = opts.with_inactive_connection_ttl(idle);
        }
        Ok(opts)
    }
}
