//! Creating, deleting and re-passwording tenant databases.
//!
//! Engine objects are created before the metadata record is written, so a
//! record always implies its grants exist. The reverse can hold briefly
//! while a creation is in flight or being compensated: when the record
//! write fails, the freshly created objects are dropped again.
//!
//! A caller that drops a provisioning future mid-flight cancels the engine
//! call, but DDL the engine already applied stays. Such orphans carry the
//! owner's prefix and can be found by name.

use std::sync::Arc;
use std::time::Duration;

use hostdb_mysql::{AdminEngine, TenantPoolManager, ddl};
use hostdb_mysql::ddl::Account;
use hostdb_store::{CredentialStore, DatabaseStats, EngineType, NewTenantDatabase, TenantDatabase};
use tracing::{debug, error, info, warn};

use crate::api::CreateDatabaseRequest;
use crate::config::HostDbConfig;
use crate::deadline::Deadline;
use crate::error::{CoreError, CoreResult};
use crate::executor::engine_error;
use crate::naming::{self, MAX_DB_NAME_LEN, MAX_USER_LEN, PasswordPolicy};
use crate::saga::{Saga, SagaStep};

/// Attempts at claiming a fresh prefix token before giving up.
const PREFIX_ATTEMPTS: usize = 8;

/// Knobs for the [`ProvisioningCoordinator`].
#[derive(Debug, Clone)]
pub struct ProvisioningSettings {
    /// Host part of every provisioned account.
    pub user_host: String,
    /// Password rules.
    pub password_policy: PasswordPolicy,
    /// Bound for one forward statement.
    pub statement_timeout: Duration,
    /// Bound for one compensating statement.
    pub compensation_timeout: Duration,
}

impl Default for ProvisioningSettings {
    fn default() -> Self {
        Self {
            user_host: "%".to_string(),
            password_policy: PasswordPolicy::default(),
            statement_timeout: Duration::from_secs(30),
            compensation_timeout: Duration::from_secs(10),
        }
    }
}

impl ProvisioningSettings {
    /// Settings from `hostdb.toml`.
    pub fn from_config(config: &HostDbConfig) -> CoreResult<Self> {
        Ok(Self {
            user_host: config.engine.user_host.clone(),
            password_policy: config.password_policy(),
            statement_timeout: config.provisioning.statement_timeout()?,
            compensation_timeout: config.provisioning.compensation_timeout()?,
        })
    }
}

/// Runs provisioning against the administrative engine and records the
/// outcome in the credential store.
pub struct ProvisioningCoordinator {
    store: Arc<dyn CredentialStore>,
    admin: Arc<dyn AdminEngine>,
    pools: Arc<TenantPoolManager>,
    settings: ProvisioningSettings,
}

impl ProvisioningCoordinator {
    /// Create a coordinator.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        admin: Arc<dyn AdminEngine>,
        pools: Arc<TenantPoolManager>,
        settings: ProvisioningSettings,
    ) -> Self {
        Self {
            store,
            admin,
            pools,
            settings,
        }
    }

    /// The active settings.
    pub fn settings(&self) -> &ProvisioningSettings {
        &self.settings
    }

    /// Provision a database and its user for `owner_id`.
    pub async fn create(
        &self,
        owner_id: &str,
        request: &CreateDatabaseRequest,
        deadline: Deadline,
    ) -> CoreResult<TenantDatabase> {
        let engine = request.database_type;
        self.settings
            .password_policy
            .check(&request.database_password)?;

        let charset = non_empty(request.charset.as_deref())
            .unwrap_or(engine.default_charset())
            .to_string();
        let collation = non_empty(request.collation.as_deref())
            .unwrap_or(engine.default_collation())
            .to_string();
        if engine == EngineType::Mysql {
            naming::check_ddl_word(&charset, "charset")?;
            naming::check_ddl_word(&collation, "collation")?;
        }

        // Reject unusable names before a prefix is ever claimed.
        naming::sanitized(&request.database_name, "database name")?;
        naming::sanitized(&request.database_user, "database user")?;

        let prefix = self.owner_prefix(owner_id).await?;
        let db_name = naming::namespaced(
            &prefix,
            &request.database_name,
            "database name",
            MAX_DB_NAME_LEN,
        )?;
        let db_user = naming::namespaced(
            &prefix,
            &request.database_user,
            "database user",
            MAX_USER_LEN,
        )?;

        if self.store.name_taken(&db_name, &db_user).await? {
            return Err(CoreError::AlreadyExists(format!(
                "database '{}' or user '{}'",
                db_name, db_user
            )));
        }

        let record = NewTenantDatabase {
            owner_id: owner_id.to_string(),
            db_name,
            db_user,
            engine_type: engine,
            charset,
            collation,
            stored_secret: request.database_password.clone(),
        };

        let created = match engine {
            EngineType::Mysql => self.create_mysql(record, deadline).await?,
            EngineType::Postgres => self.insert(record).await?,
        };

        info!(
            owner_id = %owner_id,
            db_name = %created.db_name,
            db_user = %created.db_user,
            engine = %created.engine_type,
            "Provisioned tenant database"
        );
        Ok(created)
    }

    async fn create_mysql(
        &self,
        record: NewTenantDatabase,
        deadline: Deadline,
    ) -> CoreResult<TenantDatabase> {
        let account = self.account(&record.db_user)?;
        let mut saga = self
            .saga()
            .step(
                SagaStep::new(
                    "create_database",
                    ddl::create_database(&record.db_name, &record.charset, &record.collation)
                        .map_err(invalid)?,
                )
                .compensate_with(ddl::drop_database(&record.db_name).map_err(invalid)?),
            )
            .step(
                SagaStep::new(
                    "create_user",
                    ddl::create_user(&account, &record.stored_secret),
                )
                .compensate_with(ddl::drop_user(&account)),
            )
            .step(SagaStep::new(
                "grant",
                ddl::grant_all(&record.db_name, &account).map_err(invalid)?,
            ))
            .step(SagaStep::new("flush_privileges", ddl::FLUSH_PRIVILEGES));

        saga.run(deadline).await?;

        match self.insert(record).await {
            Ok(created) => Ok(created),
            Err(e) => {
                warn!(error = %e, "Recording the database failed, revoking engine objects");
                saga.rollback().await;
                Err(e)
            }
        }
    }

    async fn insert(&self, record: NewTenantDatabase) -> CoreResult<TenantDatabase> {
        let names = format!("database '{}' or user '{}'", record.db_name, record.db_user);
        self.store.insert(record).await.map_err(|e| {
            if e.is_duplicate() {
                CoreError::AlreadyExists(names)
            } else {
                CoreError::Store(e)
            }
        })
    }

    /// Drop a database and its user, then forget the record.
    pub async fn delete(&self, owner_id: &str, id: i64, deadline: Deadline) -> CoreResult<()> {
        let record = self.get(owner_id, id).await?;

        if record.engine_type == EngineType::Mysql {
            let account = self.account(&record.db_user)?;
            self.saga()
                .step(SagaStep::new("drop_user", ddl::drop_user(&account)))
                .step(SagaStep::new(
                    "drop_database",
                    ddl::drop_database(&record.db_name).map_err(invalid)?,
                ))
                .run(deadline)
                .await?;
            self.flush_privileges(deadline).await;
        }

        self.pools.invalidate(&record.db_user).await;

        match self.store.delete(id, owner_id).await {
            Ok(true) => {}
            Ok(false) => warn!(owner_id = %owner_id, db_name = %record.db_name, "Record vanished before delete"),
            Err(e) => error!(
                owner_id = %owner_id,
                db_name = %record.db_name,
                error = %e,
                "Engine objects dropped but the record could not be deleted"
            ),
        }

        info!(owner_id = %owner_id, db_name = %record.db_name, db_user = %record.db_user, "Deleted tenant database");
        Ok(())
    }

    /// Rotate the tenant account's password.
    pub async fn change_password(
        &self,
        owner_id: &str,
        id: i64,
        new_password: &str,
        deadline: Deadline,
    ) -> CoreResult<()> {
        let record = self.get(owner_id, id).await?;
        self.settings.password_policy.check(new_password)?;

        if record.engine_type == EngineType::Mysql {
            let account = self.account(&record.db_user)?;
            self.saga()
                .step(SagaStep::new(
                    "alter_user",
                    ddl::alter_user_password(&account, new_password),
                ))
                .run(deadline)
                .await?;
        }

        self.pools.invalidate(&record.db_user).await;

        match self.store.update_secret(id, owner_id, new_password).await {
            Ok(true) => {}
            Ok(false) => warn!(owner_id = %owner_id, db_user = %record.db_user, "Record vanished before secret update"),
            Err(e) => error!(
                owner_id = %owner_id,
                db_user = %record.db_user,
                error = %e,
                "Password changed but the stored secret could not be updated"
            ),
        }

        info!(owner_id = %owner_id, db_user = %record.db_user, "Changed tenant password");
        Ok(())
    }

    /// One record, scoped to its owner.
    pub async fn get(&self, owner_id: &str, id: i64) -> CoreResult<TenantDatabase> {
        self.store
            .find(id, owner_id)
            .await?
            .ok_or(CoreError::NotFound)
    }

    /// The owner's records, newest first.
    pub async fn list(&self, owner_id: &str) -> CoreResult<Vec<TenantDatabase>> {
        Ok(self.store.list(owner_id).await?)
    }

    /// Aggregates over the owner's records.
    pub async fn stats(&self, owner_id: &str) -> CoreResult<DatabaseStats> {
        Ok(self.store.stats(owner_id).await?)
    }

    /// Measure a mysql database and store the estimate. Postgres records
    /// keep whatever estimate they have.
    pub async fn refresh_size(&self, owner_id: &str, id: i64, deadline: Deadline) -> CoreResult<f64> {
        let record = self.get(owner_id, id).await?;
        if record.engine_type != EngineType::Mysql {
            return Ok(record.size_mb);
        }

        let bound = deadline.min(Deadline::after(self.settings.statement_timeout));
        let size_mb = bound
            .bound(self.admin.database_size_mb(&record.db_name))
            .await
            .map_err(|_| CoreError::timeout("refresh_size"))?
            .map_err(engine_error)?;

        self.store.update_size(id, owner_id, size_mb).await?;
        debug!(owner_id = %owner_id, db_name = %record.db_name, size_mb, "Refreshed size estimate");
        Ok(size_mb)
    }

    /// The owner's prefix, claimed on first use.
    async fn owner_prefix(&self, owner_id: &str) -> CoreResult<String> {
        if let Some(token) = self.store.owner_prefix(owner_id).await? {
            return Ok(token);
        }

        let mut last_err = None;
        for _ in 0..PREFIX_ATTEMPTS {
            let candidate = naming::generate_prefix();
            match self.store.claim_owner_prefix(owner_id, &candidate).await {
                Ok(token) => {
                    debug!(owner_id = %owner_id, prefix = %token, "Owner prefix ready");
                    return Ok(token);
                }
                Err(e) if e.is_duplicate() => {
                    debug!(owner_id = %owner_id, "Prefix token collision, retrying");
                    last_err = Some(e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(last_err
            .map(CoreError::Store)
            .unwrap_or_else(|| CoreError::config("no prefix attempts configured")))
    }

    async fn flush_privileges(&self, deadline: Deadline) {
        let bound = deadline.min(Deadline::after(self.settings.statement_timeout));
        match bound.bound(self.admin.execute(ddl::FLUSH_PRIVILEGES)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "FLUSH PRIVILEGES failed"),
            Err(_) => warn!("FLUSH PRIVILEGES timed out"),
        }
    }

    fn account(&self, db_user: &str) -> CoreResult<Account> {
        Account::new(db_user, self.settings.user_host.as_str()).map_err(invalid)
    }

    fn saga(&self) -> Saga<'_> {
        Saga::new(
            self.admin.as_ref(),
            self.settings.statement_timeout,
            self.settings.compensation_timeout,
        )
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(e: hostdb_mysql::MysqlError) -> CoreError {
    CoreError::invalid_input(e.engine_message())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(Some(" latin1 ")), Some("latin1"));
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_settings_from_config() {
        let config = HostDbConfig::from_str(
            "[provisioning]\nmin_password_length = 10\nstatement_timeout = \"5s\"\n\n[engine]\nuser_host = \"10.0.%\"\n",
        )
        .unwrap();
        let settings = ProvisioningSettings::from_config(&config).unwrap();
        assert_eq!(settings.user_host, "10.0.%");
        assert_eq!(settings.password_policy.min_length, 10);
        assert_eq!(settings.statement_timeout, Duration::from_secs(5));
        assert_eq!(settings.compensation_timeout, Duration::from_secs(10));
    }
}
