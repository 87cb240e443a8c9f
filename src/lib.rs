//! # hostdb
//!
//! Multi-tenant database provisioning on a shared MySQL engine.
//!
//! hostdb provides:
//! - Namespaced tenant databases and accounts, created and dropped as
//!   compensating sagas
//! - A query firewall that bounds tenant-submitted SQL
//! - Per-tenant connection pools keyed by credentials
//! - An ownership and credential store on SQLite
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use hostdb::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hostdb::CoreError> {
//!     let hostdb = HostDb::connect(HostDbConfig::from_file("hostdb.toml")?).await?;
//!     let deadline = Deadline::after(Duration::from_secs(30));
//!
//!     let db = hostdb
//!         .create_database("user-42", &CreateDatabaseRequest::mysql("shop", "app", "s3cret!"), deadline)
//!         .await?;
//!     println!("created {}", db.db_name);
//!
//!     hostdb.shutdown().await;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Provisioning, execution and configuration.
pub mod service {
    pub use hostdb_core::*;
}

/// The query firewall.
pub mod firewall {
    pub use hostdb_firewall::*;
}

/// The administrative engine and tenant pools.
pub mod mysql {
    pub use hostdb_mysql::*;
}

/// The ownership and credential store.
pub mod store {
    pub use hostdb_store::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::service::{
        ChangePasswordRequest, CreateDatabaseRequest, Deadline, ExecuteQueryRequest, HostDb,
        HostDbConfig, QueryOutcome,
    };
    pub use crate::firewall::{FirewallPolicy, QueryFirewall};
    pub use crate::store::{EngineType, TenantDatabase};
}

// Re-export key types at the crate root
pub use crate::service::{CoreError, CoreResult, HostDb, HostDbConfig};
