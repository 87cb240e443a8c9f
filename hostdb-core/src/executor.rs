//! Ad-hoc tenant queries: firewall, pooled handle, normalized result.

use std::sync::Arc;

use hostdb_firewall::{QueryFirewall, StatementKind};
use hostdb_mysql::{MysqlError, TenantCredentials, TenantPoolManager};
use hostdb_store::{CredentialStore, EngineType};
use tracing::debug;

use crate::api::QueryOutcome;
use crate::deadline::Deadline;
use crate::error::{CoreError, CoreResult};

/// Map an engine error raised while a statement ran.
///
/// Rejected logins and an unreachable engine are connection errors; anything
/// else the engine reported is a failed query carrying the engine's text.
pub(crate) fn engine_error(e: MysqlError) -> CoreError {
    if e.is_connection_failure() {
        CoreError::Connection(e)
    } else {
        CoreError::QueryFailed(e.engine_message())
    }
}

/// Runs tenant SQL with the tenant's own credentials.
pub struct QueryExecutor {
    store: Arc<dyn CredentialStore>,
    pools: Arc<TenantPoolManager>,
    firewall: Arc<QueryFirewall>,
}

impl QueryExecutor {
    /// Create an executor.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        pools: Arc<TenantPoolManager>,
        firewall: Arc<QueryFirewall>,
    ) -> Self {
        Self {
            store,
            pools,
            firewall,
        }
    }

    /// Validate and run `raw` against the owner's database `id`.
    ///
    /// `supplied_password` wins when non-empty; otherwise the stored secret
    /// is used.
    pub async fn execute(
        &self,
        owner_id: &str,
        id: i64,
        raw: &str,
        supplied_password: Option<&str>,
        deadline: Deadline,
    ) -> CoreResult<QueryOutcome> {
        let record = self
            .store
            .find(id, owner_id)
            .await?
            .ok_or(CoreError::NotFound)?;

        let password = match supplied_password.filter(|p| !p.is_empty()) {
            Some(password) => password.to_string(),
            None if !record.stored_secret.is_empty() => record.stored_secret.clone(),
            None => {
                return Err(CoreError::Credential(
                    "no password supplied and none stored".to_string(),
                ));
            }
        };

        if record.engine_type != EngineType::Mysql {
            return Err(CoreError::UnsupportedEngine(record.engine_type));
        }

        let sql = self.firewall.validate(raw, &record.db_name)?;

        let credentials = TenantCredentials::new(
            record.db_user.as_str(),
            record.db_name.as_str(),
            password,
        );
        let lease = deadline
            .bound(self.pools.get(&credentials))
            .await
            .map_err(|_| CoreError::timeout("acquiring a connection"))?
            .map_err(CoreError::Connection)?;

        let kind = StatementKind::classify(&sql);
        debug!(
            owner_id = %owner_id,
            db_user = %record.db_user,
            statement = ?kind,
            "Executing tenant query"
        );

        let outcome = if kind.is_read() {
            let output = deadline
                .bound(lease.fetch(&sql))
                .await
                .map_err(|_| CoreError::timeout("query"))?
                .map_err(engine_error)?;
            QueryOutcome::rows_returned(output)
        } else {
            let affected = deadline
                .bound(lease.execute(&sql))
                .await
                .map_err(|_| CoreError::timeout("query"))?
                .map_err(engine_error)?;
            QueryOutcome::rows_affected(affected)
        };

        Ok(outcome)
    }
}
