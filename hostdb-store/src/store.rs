//! The credential store abstraction.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::model::{DatabaseStats, NewTenantDatabase, TenantDatabase};

/// Persistence for tenant database records and owner prefixes.
///
/// Every record lookup, update and delete is scoped by `(id, owner_id)`; a
/// record owned by someone else behaves exactly like a missing one.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// The owner's prefix token, if one was ever claimed.
    async fn owner_prefix(&self, owner_id: &str) -> StoreResult<Option<String>>;

    /// Record `token` for the owner unless one is already recorded, and
    /// return whichever token is on record afterwards. Fails with
    /// [`StoreError::Duplicate`](crate::StoreError::Duplicate) when another
    /// owner already holds `token`.
    async fn claim_owner_prefix(&self, owner_id: &str, token: &str) -> StoreResult<String>;

    /// Insert a record. Fails with a duplicate error if the database name or
    /// user is already taken.
    async fn insert(&self, record: NewTenantDatabase) -> StoreResult<TenantDatabase>;

    /// Look up one record.
    async fn find(&self, id: i64, owner_id: &str) -> StoreResult<Option<TenantDatabase>>;

    /// Whether any record uses the database name or the user.
    async fn name_taken(&self, db_name: &str, db_user: &str) -> StoreResult<bool>;

    /// All of an owner's records, newest first.
    async fn list(&self, owner_id: &str) -> StoreResult<Vec<TenantDatabase>>;

    /// Replace the stored secret. Returns whether a record was updated.
    async fn update_secret(&self, id: i64, owner_id: &str, secret: &str) -> StoreResult<bool>;

    /// Replace the size estimate. Returns whether a record was updated.
    async fn update_size(&self, id: i64, owner_id: &str, size_mb: f64) -> StoreResult<bool>;

    /// Remove a record. Returns whether one was removed.
    async fn delete(&self, id: i64, owner_id: &str) -> StoreResult<bool>;

    /// Aggregates over an owner's records.
    async fn stats(&self, owner_id: &str) -> StoreResult<DatabaseStats>;
}
