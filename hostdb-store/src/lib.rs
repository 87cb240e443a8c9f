//! Metadata store for hostdb: tenant database records and per-owner naming
//! prefixes, persisted in SQLite through `tokio-rusqlite`.
//!
//! # Example
//!
//! ```rust,ignore
//! use hostdb_store::{CredentialStore, SqliteCredentialStore, StoreConfig};
//!
//! let store = SqliteCredentialStore::open(&StoreConfig::file("hostdb.db")).await?;
//! let token = store.claim_owner_prefix("user-42", "ab12cd").await?;
//! let databases = store.list("user-42").await?;
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod schema;
pub mod sqlite;
pub mod store;

pub use config::{DatabasePath, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use model::{DatabaseStats, EngineType, NewTenantDatabase, ParseEngineTypeError, TenantDatabase};
pub use sqlite::SqliteCredentialStore;
pub use store::CredentialStore;
