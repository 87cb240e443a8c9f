//! MySQL engine access for hostdb.
//!
//! Two capabilities live here and are kept apart on purpose:
//!
//! - [`AdminEngine`] runs provisioning DDL as the operator account
//!   ([`MysqlAdmin`] is the `mysql_async` implementation, [`ddl`] builds the
//!   statements).
//! - [`TenantHandle`] runs tenant SQL with the tenant's own credentials.
//!   Handles come from a [`HandleFactory`] and are pooled per database user
//!   by [`TenantPoolManager`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hostdb_mysql::{MysqlConfig, MysqlHandleFactory, PoolConfig, TenantCredentials, TenantPoolManager};
//!
//! let endpoint = MysqlConfig::new("db.internal", 3306);
//! let factory = MysqlHandleFactory::new(endpoint, PoolConfig::tenant());
//! let manager = TenantPoolManager::new(Arc::new(factory), 5);
//!
//! let lease = manager
//!     .get(&TenantCredentials::new("ab12cd_app", "ab12cd_shop", "secret"))
//!     .await?;
//! let output = lease.fetch("SELECT 1 LIMIT 1000").await?;
//! ```

pub mod admin;
pub mod config;
pub mod connection;
pub mod ddl;
pub mod error;
pub mod manager;
pub mod pool;
pub mod tenant;
pub mod types;

pub use admin::{AdminEngine, MysqlAdmin};
pub use config::{MysqlConfig, SslMode};
pub use connection::MysqlConnection;
pub use error::{MysqlError, MysqlResult};
pub use manager::{PoolManagerStats, TenantLease, TenantPoolManager};
pub use pool::{MysqlPool, PoolConfig};
pub use tenant::{HandleFactory, MysqlHandleFactory, MysqlTenantHandle, TenantCredentials, TenantHandle};
pub use types::QueryOutput;
