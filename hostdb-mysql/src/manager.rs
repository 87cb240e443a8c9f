//! Per-tenant pooled handles keyed by database user.
//!
//! Handles are opened lazily on first use, probed before being stored and
//! again before every reuse, and evicted on a failed probe or an explicit
//! [`TenantPoolManager::invalidate`]. Every entry carries a semaphore sized
//! to the pool's maximum open connections; a [`TenantLease`] holds one permit
//! for as long as it is alive.
//!
//! Two requests may race to open a handle for the same user. The map insert
//! is insert-if-absent, so one handle wins and the other is closed before it
//! is ever leased.
//!
//! [`TenantPoolManager::invalidate`] bumps a per-user generation. A handle
//! opened before the bump is refused at insert time, so an open that was
//! still in flight when the credentials changed never lands in the map.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, warn};

use crate::error::{MysqlError, MysqlResult};
use crate::tenant::{HandleFactory, TenantCredentials, TenantHandle};
use crate::types::QueryOutput;

struct PoolEntry {
    handle: Arc<dyn TenantHandle>,
    secret: String,
    permits: Arc<Semaphore>,
}

impl PoolEntry {
    async fn lease(&self) -> Option<TenantLease> {
        let permit = self.permits.clone().acquire_owned().await.ok()?;
        Some(TenantLease {
            handle: self.handle.clone(),
            _permit: permit,
        })
    }

    /// Refuse new leases and close the handle. Leases already handed out
    /// keep working until the handle's connections are torn down.
    async fn retire(&self) {
        self.permits.close();
        self.handle.close().await;
    }
}

/// Exclusive use of one of a tenant handle's connection slots.
pub struct TenantLease {
    handle: Arc<dyn TenantHandle>,
    _permit: OwnedSemaphorePermit,
}

impl TenantLease {
    /// Run a statement and buffer its result set.
    pub async fn fetch(&self, sql: &str) -> MysqlResult<QueryOutput> {
        self.handle.fetch(sql).await
    }

    /// Run a statement and report the affected row count.
    pub async fn execute(&self, sql: &str) -> MysqlResult<u64> {
        self.handle.execute(sql).await
    }
}

#[derive(Default)]
struct Counters {
    opens: AtomicU64,
    reuses: AtomicU64,
    evictions: AtomicU64,
    probe_failures: AtomicU64,
    duplicate_discards: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of [`TenantPoolManager`] activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolManagerStats {
    /// Handles currently pooled.
    pub open_handles: usize,
    /// Handles opened and successfully probed.
    pub opens: u64,
    /// Requests served by an already pooled handle.
    pub reuses: u64,
    /// Handles removed by invalidation, failed probes or credential changes.
    pub evictions: u64,
    /// Liveness probes that failed on a pooled handle.
    pub probe_failures: u64,
    /// Handles closed after losing an insert race.
    pub duplicate_discards: u64,
}

#[derive(Default)]
struct PoolState {
    entries: HashMap<String, Arc<PoolEntry>>,
    generations: HashMap<String, u64>,
    epoch: u64,
}

impl PoolState {
    fn generation(&self, db_user: &str) -> (u64, u64) {
        (
            self.epoch,
            self.generations.get(db_user).copied().unwrap_or_default(),
        )
    }
}

/// Map of tenant handles keyed by database user.
pub struct TenantPoolManager {
    factory: Arc<dyn HandleFactory>,
    max_open: usize,
    state: RwLock<PoolState>,
    counters: Counters,
}

impl TenantPoolManager {
    /// Create a manager; `max_open` bounds concurrent leases per tenant.
    pub fn new(factory: Arc<dyn HandleFactory>, max_open: usize) -> Self {
        Self {
            factory,
            max_open: max_open.max(1),
            state: RwLock::new(PoolState::default()),
            counters: Counters::default(),
        }
    }

    /// Concurrent leases allowed per tenant.
    pub fn max_open(&self) -> usize {
        self.max_open
    }

    /// Lease a live handle for the credentials, opening one if needed.
    ///
    /// A pooled handle is only reused when it was opened with the same
    /// secret. Otherwise a fresh handle is opened and replaces the pooled one
    /// once its probe succeeds; if the probe fails the pooled handle stays.
    pub async fn get(&self, credentials: &TenantCredentials) -> MysqlResult<TenantLease> {
        let user = credentials.db_user.as_str();
        let generation = self.state.read().generation(user);

        if let Some(entry) = self.lookup(user) {
            if entry.secret == credentials.password() {
                if let Some(lease) = entry.lease().await {
                    match lease.handle.ping().await {
                        Ok(()) => {
                            Counters::bump(&self.counters.reuses);
                            return Ok(lease);
                        }
                        Err(e) => {
                            Counters::bump(&self.counters.probe_failures);
                            warn!(db_user = %user, error = %e, "Pooled handle failed liveness probe");
                            drop(lease);
                            self.evict_if_current(user, &entry).await;
                        }
                    }
                }
            } else {
                debug!(db_user = %user, "Secret differs from pooled handle, opening a fresh one");
            }
        }

        let fresh = self.open(credentials).await?;
        let entry = self.install(user, fresh, generation).await?;
        entry
            .lease()
            .await
            .ok_or_else(|| MysqlError::connection(format!("handle for '{}' was invalidated", user)))
    }

    /// Close and forget the handle for `db_user`. Returns whether one was
    /// pooled. Handles still being opened for `db_user` are refused when
    /// they try to join the map.
    pub async fn invalidate(&self, db_user: &str) -> bool {
        let removed = {
            let mut state = self.state.write();
            *state.generations.entry(db_user.to_string()).or_default() += 1;
            state.entries.remove(db_user)
        };
        match removed {
            Some(entry) => {
                Counters::bump(&self.counters.evictions);
                info!(db_user = %db_user, "Invalidated pooled handle");
                entry.retire().await;
                true
            }
            None => false,
        }
    }

    /// Close every pooled handle.
    pub async fn close_all(&self) {
        let drained: Vec<_> = {
            let mut state = self.state.write();
            state.epoch += 1;
            state.entries.drain().collect()
        };
        let count = drained.len();
        for (_, entry) in drained {
            entry.retire().await;
        }
        info!(handles = count, "Closed all tenant handles");
    }

    /// Whether a handle is pooled for `db_user`.
    pub fn contains(&self, db_user: &str) -> bool {
        self.state.read().entries.contains_key(db_user)
    }

    /// Number of pooled handles.
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    /// Whether no handle is pooled.
    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }

    /// Snapshot the activity counters.
    pub fn stats(&self) -> PoolManagerStats {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        PoolManagerStats {
            open_handles: self.len(),
            opens: load(&self.counters.opens),
            reuses: load(&self.counters.reuses),
            evictions: load(&self.counters.evictions),
            probe_failures: load(&self.counters.probe_failures),
            duplicate_discards: load(&self.counters.duplicate_discards),
        }
    }

    fn lookup(&self, db_user: &str) -> Option<Arc<PoolEntry>> {
        self.state.read().entries.get(db_user).cloned()
    }

    async fn open(&self, credentials: &TenantCredentials) -> MysqlResult<Arc<PoolEntry>> {
        let handle = self.factory.open(credentials).await?;
        if let Err(e) = handle.ping().await {
            debug!(db_user = %credentials.db_user, error = %e, "Fresh handle failed probe");
            handle.close().await;
            return Err(e);
        }
        Counters::bump(&self.counters.opens);
        debug!(db_user = %credentials.db_user, "Opened tenant handle");
        Ok(Arc::new(PoolEntry {
            handle,
            secret: credentials.password().to_string(),
            permits: Arc::new(Semaphore::new(self.max_open)),
        }))
    }

    /// Insert-if-absent. An entry opened with a different secret is replaced,
    /// one with the same secret wins and `fresh` is discarded.
    ///
    /// `generation` is what the caller observed before opening `fresh`; if
    /// the user was invalidated since, `fresh` is closed and refused.
    async fn install(
        &self,
        db_user: &str,
        fresh: Arc<PoolEntry>,
        generation: (u64, u64),
    ) -> MysqlResult<Arc<PoolEntry>> {
        let (winner, discarded) = {
            let mut state = self.state.write();
            if state.generation(db_user) != generation {
                (None, Some(fresh))
            } else {
                match state.entries.entry(db_user.to_string()) {
                    Entry::Vacant(slot) => {
                        slot.insert(fresh.clone());
                        (Some(fresh), None)
                    }
                    Entry::Occupied(slot) if slot.get().secret == fresh.secret => {
                        Counters::bump(&self.counters.duplicate_discards);
                        (Some(slot.get().clone()), Some(fresh))
                    }
                    Entry::Occupied(mut slot) => {
                        Counters::bump(&self.counters.evictions);
                        let stale = slot.insert(fresh.clone());
                        (Some(fresh), Some(stale))
                    }
                }
            }
        };
        if let Some(entry) = discarded {
            entry.retire().await;
        }
        winner.ok_or_else(|| {
            debug!(db_user = %db_user, "Handle opened across an invalidation, discarded");
            MysqlError::connection(format!(
                "credentials for '{}' changed while connecting",
                db_user
            ))
        })
    }

    async fn evict_if_current(&self, db_user: &str, entry: &Arc<PoolEntry>) {
        let removed = {
            let mut state = self.state.write();
            match state.entries.get(db_user) {
                Some(current) if Arc::ptr_eq(current, entry) => state.entries.remove(db_user),
                _ => None,
            }
        };
        if let Some(entry) = removed {
            Counters::bump(&self.counters.evictions);
            entry.retire().await;
        }
    }
}
