//! # hostdb-core
//!
//! Tenant database provisioning and ad-hoc query execution on a shared
//! MySQL engine.
//!
//! - [`ProvisioningCoordinator`] creates, deletes and re-passwords tenant
//!   databases. Engine DDL runs as a [`Saga`] with compensating steps, and
//!   the metadata record is written only after the engine side succeeded.
//! - [`QueryExecutor`] runs tenant SQL through the query firewall and a
//!   pooled handle logged in as the tenant.
//! - [`HostDb`] wires both to a credential store, an administrative engine
//!   and a tenant pool manager built from [`HostDbConfig`].
//!
//! Every engine call is bounded by a caller-supplied [`Deadline`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use hostdb_core::{CreateDatabaseRequest, Deadline, ExecuteQueryRequest, HostDb, HostDbConfig};
//!
//! let config = HostDbConfig::from_file("hostdb.toml")?;
//! let hostdb = HostDb::connect(config).await?;
//!
//! let deadline = Deadline::after(Duration::from_secs(30));
//! let db = hostdb
//!     .create_database("user-42", &CreateDatabaseRequest::mysql("shop", "app", "s3cret!"), deadline)
//!     .await?;
//!
//! let request = ExecuteQueryRequest { query: "SELECT 1".into(), password: None };
//! let outcome = hostdb.execute_query("user-42", db.id, &request, deadline).await?;
//! assert_eq!(outcome.message, "1 rows returned");
//! ```

pub mod api;
pub mod config;
pub mod deadline;
pub mod error;
pub mod executor;
pub mod logging;
pub mod naming;
pub mod provisioning;
pub mod saga;
pub mod service;

pub use api::{ChangePasswordRequest, CreateDatabaseRequest, ExecuteQueryRequest, QueryOutcome};
pub use config::{HostDbConfig, LoggingConfig, parse_duration};
pub use deadline::{Deadline, DeadlineExceeded};
pub use error::{CoreError, CoreResult};
pub use executor::QueryExecutor;
pub use naming::PasswordPolicy;
pub use provisioning::{ProvisioningCoordinator, ProvisioningSettings};
pub use saga::{Saga, SagaStep};
pub use service::HostDb;
