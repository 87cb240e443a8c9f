//! In-process engine and store doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use hostdb_core::{HostDb, HostDbConfig};
use hostdb_mysql::{
    AdminEngine, HandleFactory, MysqlError, MysqlResult, QueryOutput, TenantCredentials,
    TenantHandle,
};
use hostdb_store::{
    CredentialStore, DatabaseStats, NewTenantDatabase, SqliteCredentialStore, StoreError,
    StoreResult, TenantDatabase,
};
use parking_lot::Mutex;
use serde_json::Value as JsonValue;

pub const OWNER: &str = "owner-1";
pub const OTHER_OWNER: &str = "owner-2";

fn server_error(code: u16, message: impl Into<String>) -> MysqlError {
    MysqlError::Mysql(mysql_async::Error::Server(mysql_async::ServerError {
        code,
        message: message.into(),
        state: "HY000".to_string(),
    }))
}

/// Text between the first pair of `open`/`close` delimiters after `from`.
fn between<'a>(text: &'a str, from: usize, open: char, close: char) -> Option<&'a str> {
    let start = text[from..].find(open)? + from + 1;
    let end = text[start..].find(close)? + start;
    Some(&text[start..end])
}

fn user_of(statement: &str) -> Option<String> {
    between(statement, 0, '\'', '\'').map(str::to_string)
}

fn db_of(statement: &str) -> Option<String> {
    between(statement, 0, '`', '`').map(str::to_string)
}

/// The secret after `IDENTIFIED BY`, unescaped.
fn secret_of(statement: &str) -> Option<String> {
    let idx = statement.find("IDENTIFIED BY '")? + "IDENTIFIED BY '".len();
    let body = statement[idx..].strip_suffix('\'')?;
    Some(body.replace("''", "'").replace("\\\\", "\\"))
}

#[derive(Default)]
struct EngineState {
    databases: HashSet<String>,
    users: HashMap<String, String>,
    /// (user, database)
    grants: HashSet<(String, String)>,
    sizes: HashMap<String, f64>,
}

#[derive(Default)]
struct EngineInner {
    state: Mutex<EngineState>,
    admin_log: Mutex<Vec<String>>,
    fail_on: Mutex<Option<String>>,
    admin_delay: Mutex<Option<(String, Duration)>>,
    tenant_delay: Mutex<Duration>,
    handles_opened: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
}

/// A MySQL stand-in that understands the provisioning DDL and checks tenant
/// logins against the accounts and grants it holds.
#[derive(Clone, Default)]
pub struct FakeEngine {
    inner: Arc<EngineInner>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every administrative statement starting with `prefix`.
    pub fn fail_on(&self, prefix: &str) {
        *self.inner.fail_on.lock() = Some(prefix.to_string());
    }

    pub fn clear_failures(&self) {
        *self.inner.fail_on.lock() = None;
    }

    /// Apply statements starting with `prefix`, then stall before replying.
    pub fn delay_admin(&self, prefix: &str, delay: Duration) {
        *self.inner.admin_delay.lock() = Some((prefix.to_string(), delay));
    }

    /// Stall every tenant statement.
    pub fn delay_tenant(&self, delay: Duration) {
        *self.inner.tenant_delay.lock() = delay;
    }

    pub fn set_size(&self, db: &str, size_mb: f64) {
        self.inner.state.lock().sizes.insert(db.to_string(), size_mb);
    }

    pub fn has_database(&self, db: &str) -> bool {
        self.inner.state.lock().databases.contains(db)
    }

    pub fn has_user(&self, user: &str) -> bool {
        self.inner.state.lock().users.contains_key(user)
    }

    pub fn has_grant(&self, user: &str, db: &str) -> bool {
        self.inner
            .state
            .lock()
            .grants
            .contains(&(user.to_string(), db.to_string()))
    }

    pub fn password_of(&self, user: &str) -> Option<String> {
        self.inner.state.lock().users.get(user).cloned()
    }

    pub fn database_count(&self) -> usize {
        self.inner.state.lock().databases.len()
    }

    pub fn user_count(&self) -> usize {
        self.inner.state.lock().users.len()
    }

    /// Administrative statements that succeeded, in order.
    pub fn admin_log(&self) -> Vec<String> {
        self.inner.admin_log.lock().clone()
    }

    pub fn handles_opened(&self) -> usize {
        self.inner.handles_opened.load(Ordering::SeqCst)
    }

    /// Most tenant statements ever in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.inner.peak.load(Ordering::SeqCst)
    }

    fn apply(&self, statement: &str) -> MysqlResult<()> {
        let mut state = self.inner.state.lock();
        let missing = || MysqlError::query(format!("unparseable statement: {}", statement));

        if statement.starts_with("CREATE DATABASE") {
            let db = db_of(statement).ok_or_else(missing)?;
            if !state.databases.insert(db.clone()) {
                return Err(server_error(
                    1007,
                    format!("Can't create database '{}'; database exists", db),
                ));
            }
        } else if statement.starts_with("DROP DATABASE IF EXISTS") {
            let db = db_of(statement).ok_or_else(missing)?;
            state.databases.remove(&db);
            state.grants.retain(|(_, granted)| granted != &db);
        } else if statement.starts_with("CREATE USER") {
            let user = user_of(statement).ok_or_else(missing)?;
            let secret = secret_of(statement).ok_or_else(missing)?;
            if state.users.contains_key(&user) {
                return Err(server_error(1396, format!("Operation CREATE USER failed for '{}'", user)));
            }
            state.users.insert(user, secret);
        } else if statement.starts_with("DROP USER IF EXISTS") {
            let user = user_of(statement).ok_or_else(missing)?;
            state.users.remove(&user);
            state.grants.retain(|(grantee, _)| grantee != &user);
        } else if statement.starts_with("GRANT ALL PRIVILEGES") {
            let db = db_of(statement).ok_or_else(missing)?;
            let user = user_of(statement).ok_or_else(missing)?;
            if !state.users.contains_key(&user) {
                return Err(server_error(1410, "You are not allowed to create a user with GRANT"));
            }
            state.grants.insert((user, db));
        } else if statement.starts_with("ALTER USER") {
            let user = user_of(statement).ok_or_else(missing)?;
            let secret = secret_of(statement).ok_or_else(missing)?;
            match state.users.get_mut(&user) {
                Some(current) => *current = secret,
                None => {
                    return Err(server_error(1396, format!("Operation ALTER USER failed for '{}'", user)));
                }
            }
        } else if statement != "FLUSH PRIVILEGES" {
            return Err(missing());
        }
        Ok(())
    }

    fn login(&self, user: &str, password: &str, db: &str) -> MysqlResult<()> {
        let state = self.inner.state.lock();
        if state.users.get(user).map(String::as_str) != Some(password) {
            return Err(server_error(
                1045,
                format!("Access denied for user '{}'@'%' (using password: YES)", user),
            ));
        }
        if !state.grants.contains(&(user.to_string(), db.to_string())) {
            return Err(server_error(
                1044,
                format!("Access denied for user '{}'@'%' to database '{}'", user, db),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl AdminEngine for FakeEngine {
    async fn execute(&self, statement: &str) -> MysqlResult<()> {
        let failing = self.inner.fail_on.lock().clone();
        if failing.is_some_and(|prefix| statement.starts_with(&prefix)) {
            return Err(server_error(1227, "Access denied; you need the CREATE USER privilege"));
        }

        self.apply(statement)?;
        self.inner.admin_log.lock().push(statement.to_string());

        let delay = self.inner.admin_delay.lock().clone();
        if let Some((prefix, delay)) = delay {
            if statement.starts_with(&prefix) {
                tokio::time::sleep(delay).await;
            }
        }
        Ok(())
    }

    async fn database_size_mb(&self, db_name: &str) -> MysqlResult<f64> {
        Ok(self
            .inner
            .state
            .lock()
            .sizes
            .get(db_name)
            .copied()
            .unwrap_or(0.0))
    }
}

#[async_trait]
impl HandleFactory for FakeEngine {
    async fn open(&self, credentials: &TenantCredentials) -> MysqlResult<Arc<dyn TenantHandle>> {
        self.inner.handles_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeHandle {
            engine: self.clone(),
            user: credentials.db_user.clone(),
            db: credentials.db_name.clone(),
            password: credentials.password().to_string(),
            closed: AtomicBool::new(false),
        }))
    }
}

/// A tenant session. The login is re-checked on every probe, like a fresh
/// connection would be.
pub struct FakeHandle {
    engine: FakeEngine,
    user: String,
    db: String,
    password: String,
    closed: AtomicBool,
}

impl FakeHandle {
    async fn run(&self, sql: &str) -> MysqlResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(MysqlError::connection("connection closed"));
        }

        let inner = &self.engine.inner;
        let now = inner.active.fetch_add(1, Ordering::SeqCst) + 1;
        inner.peak.fetch_max(now, Ordering::SeqCst);
        let delay = *inner.tenant_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        inner.active.fetch_sub(1, Ordering::SeqCst);

        if sql.contains("BROKEN") {
            return Err(server_error(
                1064,
                "You have an error in your SQL syntax near 'BROKEN'",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl TenantHandle for FakeHandle {
    async fn ping(&self) -> MysqlResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(MysqlError::connection("connection closed"));
        }
        self.engine.login(&self.user, &self.password, &self.db)
    }

    async fn fetch(&self, sql: &str) -> MysqlResult<QueryOutput> {
        self.run(sql).await?;
        Ok(QueryOutput {
            columns: vec!["statement".to_string(), "db".to_string()],
            rows: vec![vec![
                JsonValue::String(sql.to_string()),
                JsonValue::String(self.db.clone()),
            ]],
        })
    }

    async fn execute(&self, sql: &str) -> MysqlResult<u64> {
        self.run(sql).await?;
        Ok(1)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// In-memory SQLite store with switchable write failures.
pub struct FlakyStore {
    inner: SqliteCredentialStore,
    pub fail_insert: AtomicBool,
    pub fail_update_secret: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl FlakyStore {
    pub async fn new() -> Self {
        Self {
            inner: SqliteCredentialStore::open_in_memory().await.unwrap(),
            fail_insert: AtomicBool::new(false),
            fail_update_secret: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
        }
    }

    fn check(flag: &AtomicBool) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::corrupt("injected failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CredentialStore for FlakyStore {
    async fn owner_prefix(&self, owner_id: &str) -> StoreResult<Option<String>> {
        self.inner.owner_prefix(owner_id).await
    }

    async fn claim_owner_prefix(&self, owner_id: &str, token: &str) -> StoreResult<String> {
        self.inner.claim_owner_prefix(owner_id, token).await
    }

    async fn insert(&self, record: NewTenantDatabase) -> StoreResult<TenantDatabase> {
        Self::check(&self.fail_insert)?;
        self.inner.insert(record).await
    }

    async fn find(&self, id: i64, owner_id: &str) -> StoreResult<Option<TenantDatabase>> {
        self.inner.find(id, owner_id).await
    }

    async fn name_taken(&self, db_name: &str, db_user: &str) -> StoreResult<bool> {
        self.inner.name_taken(db_name, db_user).await
    }

    async fn list(&self, owner_id: &str) -> StoreResult<Vec<TenantDatabase>> {
        self.inner.list(owner_id).await
    }

    async fn update_secret(&self, id: i64, owner_id: &str, secret: &str) -> StoreResult<bool> {
        Self::check(&self.fail_update_secret)?;
        self.inner.update_secret(id, owner_id, secret).await
    }

    async fn update_size(&self, id: i64, owner_id: &str, size_mb: f64) -> StoreResult<bool> {
        self.inner.update_size(id, owner_id, size_mb).await
    }

    async fn delete(&self, id: i64, owner_id: &str) -> StoreResult<bool> {
        Self::check(&self.fail_delete)?;
        self.inner.delete(id, owner_id).await
    }

    async fn stats(&self, owner_id: &str) -> StoreResult<DatabaseStats> {
        self.inner.stats(owner_id).await
    }
}

pub struct Harness {
    pub engine: FakeEngine,
    pub store: Arc<FlakyStore>,
    pub hostdb: HostDb,
}

pub async fn harness() -> Harness {
    harness_with(HostDbConfig::default()).await
}

pub async fn harness_with(config: HostDbConfig) -> Harness {
    let engine = FakeEngine::new();
    let store = Arc::new(FlakyStore::new().await);
    let hostdb = HostDb::from_parts(
        config,
        store.clone(),
        Arc::new(engine.clone()),
        Arc::new(engine.clone()),
    )
    .unwrap();
    Harness {
        engine,
        store,
        hostdb,
    }
}
