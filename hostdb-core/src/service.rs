//! The `HostDb` facade tying store, engine, pools and firewall together.

use std::sync::Arc;

use hostdb_firewall::QueryFirewall;
use hostdb_mysql::{
    AdminEngine, HandleFactory, MysqlAdmin, MysqlHandleFactory, PoolManagerStats,
    TenantPoolManager,
};
use hostdb_store::{CredentialStore, DatabaseStats, SqliteCredentialStore, TenantDatabase};
use tracing::info;

use crate::api::{ChangePasswordRequest, CreateDatabaseRequest, ExecuteQueryRequest, QueryOutcome};
use crate::config::HostDbConfig;
use crate::deadline::Deadline;
use crate::error::{CoreError, CoreResult};
use crate::executor::QueryExecutor;
use crate::provisioning::{ProvisioningCoordinator, ProvisioningSettings};

/// Boundary operations of the tenant database service.
///
/// Every operation takes the authenticated owner id; resolving it is the
/// caller's job.
pub struct HostDb {
    config: HostDbConfig,
    admin: Arc<dyn AdminEngine>,
    pools: Arc<TenantPoolManager>,
    firewall: Arc<QueryFirewall>,
    provisioning: ProvisioningCoordinator,
    executor: QueryExecutor,
}

impl HostDb {
    /// Build the MySQL and SQLite stack described by `config`.
    ///
    /// Fails fast when the operator account cannot log in.
    pub async fn connect(config: HostDbConfig) -> CoreResult<Self> {
        let admin = MysqlAdmin::connect(config.admin_mysql_config()?)
            .map_err(|e| CoreError::config(e.to_string()))?;
        admin.ping().await.map_err(CoreError::Connection)?;
        let factory = MysqlHandleFactory::new(config.tenant_endpoint()?, config.tenant_pool_config()?);
        let store = SqliteCredentialStore::open(&config.store_config()?).await?;

        info!(store = %config.store.path, "hostdb connected");
        Self::from_parts(config, Arc::new(store), Arc::new(admin), Arc::new(factory))
    }

    /// Assemble from arbitrary implementations.
    pub fn from_parts(
        config: HostDbConfig,
        store: Arc<dyn CredentialStore>,
        admin: Arc<dyn AdminEngine>,
        factory: Arc<dyn HandleFactory>,
    ) -> CoreResult<Self> {
        config.validate()?;
        let settings = ProvisioningSettings::from_config(&config)?;
        let pools = Arc::new(TenantPoolManager::new(factory, config.pool.max_open));
        let firewall = Arc::new(QueryFirewall::new(config.firewall.clone()));

        let provisioning =
            ProvisioningCoordinator::new(store.clone(), admin.clone(), pools.clone(), settings);
        let executor = QueryExecutor::new(store, pools.clone(), firewall.clone());

        Ok(Self {
            config,
            admin,
            pools,
            firewall,
            provisioning,
            executor,
        })
    }

    /// The loaded configuration.
    pub fn config(&self) -> &HostDbConfig {
        &self.config
    }

    /// Provision a database for `owner_id`.
    pub async fn create_database(
        &self,
        owner_id: &str,
        request: &CreateDatabaseRequest,
        deadline: Deadline,
    ) -> CoreResult<TenantDatabase> {
        self.provisioning.create(owner_id, request, deadline).await
    }

    /// Drop a database, its user and its record.
    pub async fn delete_database(&self, owner_id: &str, id: i64, deadline: Deadline) -> CoreResult<()> {
        self.provisioning.delete(owner_id, id, deadline).await
    }

    /// Rotate a tenant password.
    pub async fn change_password(
        &self,
        owner_id: &str,
        id: i64,
        request: &ChangePasswordRequest,
        deadline: Deadline,
    ) -> CoreResult<()> {
        self.provisioning
            .change_password(owner_id, id, &request.new_password, deadline)
            .await
    }

    /// Run an ad-hoc query.
    pub async fn execute_query(
        &self,
        owner_id: &str,
        id: i64,
        request: &ExecuteQueryRequest,
        deadline: Deadline,
    ) -> CoreResult<QueryOutcome> {
        self.executor
            .execute(owner_id, id, &request.query, request.password.as_deref(), deadline)
            .await
    }

    /// The owner's databases, newest first.
    pub async fn list_databases(&self, owner_id: &str) -> CoreResult<Vec<TenantDatabase>> {
        self.provisioning.list(owner_id).await
    }

    /// One of the owner's databases.
    pub async fn get_database(&self, owner_id: &str, id: i64) -> CoreResult<TenantDatabase> {
        self.provisioning.get(owner_id, id).await
    }

    /// Aggregates over the owner's databases.
    pub async fn stats(&self, owner_id: &str) -> CoreResult<DatabaseStats> {
        self.provisioning.stats(owner_id).await
    }

    /// Re-measure a database's size.
    pub async fn refresh_size(&self, owner_id: &str, id: i64, deadline: Deadline) -> CoreResult<f64> {
        self.provisioning.refresh_size(owner_id, id, deadline).await
    }

    /// Run the firewall alone.
    pub fn validate_query(&self, raw: &str, target_db: &str) -> CoreResult<String> {
        Ok(self.firewall.validate(raw, target_db)?)
    }

    /// Pool manager activity.
    pub fn pool_stats(&self) -> PoolManagerStats {
        self.pools.stats()
    }

    /// Close every tenant handle and the administrative handle.
    pub async fn shutdown(&self) {
        self.pools.close_all().await;
        self.admin.close().await;
        info!("hostdb shut down");
    }
}
