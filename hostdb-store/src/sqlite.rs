//! [`CredentialStore`] over SQLite.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{OptionalExtension, params};
use tokio_rusqlite::Connection;
use tracing::{debug, info};

use crate::config::{DatabasePath, StoreConfig};
use crate::error::StoreResult;
use crate::model::{DatabaseStats, NewTenantDatabase, TenantDatabase};
use crate::schema::SCHEMA;
use crate::store::CredentialStore;

const RECORD_COLUMNS: &str = "id, owner_id, db_name, db_user, engine_type, charset, collation, \
                              stored_secret, size_mb, created_at";

/// SQLite-backed credential store.
///
/// All statements go through one `tokio-rusqlite` connection, which runs
/// them in order on its own thread.
#[derive(Clone)]
pub struct SqliteCredentialStore {
    conn: Connection,
}

impl SqliteCredentialStore {
    /// Open the store and apply the schema.
    pub async fn open(config: &StoreConfig) -> StoreResult<Self> {
        let conn = match &config.path {
            DatabasePath::Memory => Connection::open_in_memory().await?,
            DatabasePath::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        crate::StoreError::config(format!(
                            "cannot create {}: {}",
                            parent.display(),
                            e
                        ))
                    })?;
                }
                Connection::open(path).await?
            }
        };

        let init_sql = format!("{}{}", config.init_sql(), SCHEMA);
        conn.call(move |conn| {
            conn.execute_batch(&init_sql)?;
            Ok(())
        })
        .await?;

        info!(path = %config.path.display(), "Credential store opened");
        Ok(Self { conn })
    }

    /// Open a private in-memory store.
    pub async fn open_in_memory() -> StoreResult<Self> {
        Self::open(&StoreConfig::memory()).await
    }

    /// Close the underlying connection.
    pub async fn close(self) -> StoreResult<()> {
        self.conn.close().await?;
        Ok(())
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn map_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<TenantDatabase> {
    let engine: String = row.get(4)?;
    let created: String = row.get(9)?;
    Ok(TenantDatabase {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        db_name: row.get(2)?,
        db_user: row.get(3)?,
        engine_type: engine.parse().map_err(|e| conversion_error(4, e))?,
        charset: row.get(5)?,
        collation: row.get(6)?,
        stored_secret: row.get(7)?,
        size_mb: row.get(8)?,
        created_at: DateTime::parse_from_rfc3339(&created)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| conversion_error(9, e))?,
    })
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn owner_prefix(&self, owner_id: &str) -> StoreResult<Option<String>> {
        let owner_id = owner_id.to_string();
        let token = self
            .conn
            .call(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT token FROM owner_prefixes WHERE owner_id = ?1",
                        [&owner_id],
                        |row| row.get(0),
                    )
                    .optional()?)
            })
            .await?;
        Ok(token)
    }

    async fn claim_owner_prefix(&self, owner_id: &str, token: &str) -> StoreResult<String> {
        let owner_id = owner_id.to_string();
        let token = token.to_string();
        let created_at = timestamp(Utc::now());
        let winner = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO owner_prefixes (owner_id, token, created_at) VALUES (?1, ?2, ?3) \
                     ON CONFLICT(owner_id) DO NOTHING",
                    params![owner_id, token, created_at],
                )?;
                Ok(conn.query_row(
                    "SELECT token FROM owner_prefixes WHERE owner_id = ?1",
                    [&owner_id],
                    |row| row.get::<_, String>(0),
                )?)
            })
            .await?;
        Ok(winner)
    }

    async fn insert(&self, record: NewTenantDatabase) -> StoreResult<TenantDatabase> {
        // Stored with microsecond precision; keep the returned value identical.
        let created_at = Utc::now().trunc_subsecs(6);
        let stamp = timestamp(created_at);
        let row = record.clone();
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO tenant_databases (owner_id, db_name, db_user, engine_type, \
                     charset, collation, stored_secret, size_mb, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0.0, ?8)",
                    params![
                        row.owner_id,
                        row.db_name,
                        row.db_user,
                        row.engine_type.as_str(),
                        row.charset,
                        row.collation,
                        row.stored_secret,
                        stamp,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        debug!(owner_id = %record.owner_id, db_name = %record.db_name, id, "Recorded tenant database");

        Ok(TenantDatabase {
            id,
            owner_id: record.owner_id,
            db_name: record.db_name,
            db_user: record.db_user,
            engine_type: record.engine_type,
            charset: record.charset,
            collation: record.collation,
            stored_secret: record.stored_secret,
            size_mb: 0.0,
            created_at,
        })
    }

    async fn find(&self, id: i64, owner_id: &str) -> StoreResult<Option<TenantDatabase>> {
        let owner_id = owner_id.to_string();
        let sql = format!(
            "SELECT {} FROM tenant_databases WHERE id = ?1 AND owner_id = ?2",
            RECORD_COLUMNS
        );
        let record = self
            .conn
            .call(move |conn| {
                Ok(conn
                    .query_row(&sql, params![id, owner_id], map_record)
                    .optional()?)
            })
            .await?;
        Ok(record)
    }

    async fn name_taken(&self, db_name: &str, db_user: &str) -> StoreResult<bool> {
        let db_name = db_name.to_string();
        let db_user = db_user.to_string();
        let taken = self
            .conn
            .call(move |conn| {
                Ok(conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM tenant_databases WHERE db_name = ?1 OR db_user = ?2)",
                    params![db_name, db_user],
                    |row| row.get::<_, bool>(0),
                )?)
            })
            .await?;
        Ok(taken)
    }

    async fn list(&self, owner_id: &str) -> StoreResult<Vec<TenantDatabase>> {
        let owner_id = owner_id.to_string();
        let sql = format!(
            "SELECT {} FROM tenant_databases WHERE owner_id = ?1 ORDER BY created_at DESC, id DESC",
            RECORD_COLUMNS
        );
        let records = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([&owner_id], map_record)?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            })
            .await?;
        Ok(records)
    }

    async fn update_secret(&self, id: i64, owner_id: &str, secret: &str) -> StoreResult<bool> {
        let owner_id = owner_id.to_string();
        let secret = secret.to_string();
        let changed = self
            .conn
            .call(move |conn| {
                Ok(conn.execute(
                    "UPDATE tenant_databases SET stored_secret = ?1 WHERE id = ?2 AND owner_id = ?3",
                    params![secret, id, owner_id],
                )?)
            })
            .await?;
        Ok(changed > 0)
    }

    async fn update_size(&self, id: i64, owner_id: &str, size_mb: f64) -> StoreResult<bool> {
        let owner_id = owner_id.to_string();
        let changed = self
            .conn
            .call(move |conn| {
                Ok(conn.execute(
                    "UPDATE tenant_databases SET size_mb = ?1 WHERE id = ?2 AND owner_id = ?3",
                    params![size_mb, id, owner_id],
                )?)
            })
            .await?;
        Ok(changed > 0)
    }

    async fn delete(&self, id: i64, owner_id: &str) -> StoreResult<bool> {
        let owner = owner_id.to_string();
        let removed = self
            .conn
            .call(move |conn| {
                Ok(conn.execute(
                    "DELETE FROM tenant_databases WHERE id = ?1 AND owner_id = ?2",
                    params![id, owner],
                )?)
            })
            .await?;
        debug!(owner_id = %owner_id, id, removed, "Deleted tenant database record");
        Ok(removed > 0)
    }

    async fn stats(&self, owner_id: &str) -> StoreResult<DatabaseStats> {
        let owner_id = owner_id.to_string();
        let stats = self
            .conn
            .call(move |conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*), \
                            COALESCE(SUM(engine_type = 'mysql'), 0), \
                            COALESCE(SUM(engine_type = 'postgres'), 0), \
                            COALESCE(SUM(size_mb), 0.0) \
                     FROM tenant_databases WHERE owner_id = ?1",
                    [&owner_id],
                    |row| {
                        Ok(DatabaseStats {
                            total_databases: row.get::<_, i64>(0)? as u64,
                            mysql_count: row.get::<_, i64>(1)? as u64,
                            postgres_count: row.get::<_, i64>(2)? as u64,
                            total_size_mb: row.get(3)?,
                        })
                    },
                )?)
            })
            .await?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EngineType;
    use pretty_assertions::assert_eq;

    fn new_record(owner: &str, name: &str) -> NewTenantDatabase {
        NewTenantDatabase {
            owner_id: owner.to_string(),
            db_name: format!("ab12cd_{}", name),
            db_user: format!("ab12cd_{}_u", name),
            engine_type: EngineType::Mysql,
            charset: "utf8mb4".to_string(),
            collation: "utf8mb4_unicode_ci".to_string(),
            stored_secret: "s3cret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = SqliteCredentialStore::open_in_memory().await.unwrap();
        let created = store.insert(new_record("owner-1", "shop")).await.unwrap();

        let found = store.find(created.id, "owner-1").await.unwrap().unwrap();
        assert_eq!(found, created);
        assert_eq!(found.size_mb, 0.0);
        assert_eq!(found.stored_secret, "s3cret");
    }

    #[tokio::test]
    async fn test_find_is_owner_scoped() {
        let store = SqliteCredentialStore::open_in_memory().await.unwrap();
        let created = store.insert(new_record("owner-1", "shop")).await.unwrap();

        assert!(store.find(created.id, "owner-2").await.unwrap().is_none());
        assert!(!store.delete(created.id, "owner-2").await.unwrap());
        assert!(!store.update_secret(created.id, "owner-2", "x").await.unwrap());
    }

    #[tokio::test]
    async fn test_unique_names() {
        let store = SqliteCredentialStore::open_in_memory().await.unwrap();
        store.insert(new_record("owner-1", "shop")).await.unwrap();

        let err = store.insert(new_record("owner-1", "shop")).await.unwrap_err();
        assert!(err.is_duplicate());
        assert!(store.name_taken("ab12cd_shop", "other").await.unwrap());
        assert!(store.name_taken("other", "ab12cd_shop_u").await.unwrap());
        assert!(!store.name_taken("other", "other").await.unwrap());
    }

    #[tokio::test]
    async fn test_claim_owner_prefix_keeps_first() {
        let store = SqliteCredentialStore::open_in_memory().await.unwrap();
        assert_eq!(store.owner_prefix("owner-1").await.unwrap(), None);

        assert_eq!(
            store.claim_owner_prefix("owner-1", "ab12cd").await.unwrap(),
            "ab12cd"
        );
        assert_eq!(
            store.claim_owner_prefix("owner-1", "ffffff").await.unwrap(),
            "ab12cd"
        );
        assert_eq!(
            store.owner_prefix("owner-1").await.unwrap().as_deref(),
            Some("ab12cd")
        );
    }

    #[tokio::test]
    async fn test_prefix_tokens_are_unique_across_owners() {
        let store = SqliteCredentialStore::open_in_memory().await.unwrap();
        store.claim_owner_prefix("owner-1", "ab12cd").await.unwrap();

        let err = store
            .claim_owner_prefix("owner-2", "ab12cd")
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn test_updates_and_delete() {
        let store = SqliteCredentialStore::open_in_memory().await.unwrap();
        let created = store.insert(new_record("owner-1", "shop")).await.unwrap();

        assert!(store.update_secret(created.id, "owner-1", "n3w").await.unwrap());
        assert!(store.update_size(created.id, "owner-1", 12.25).await.unwrap());

        let found = store.find(created.id, "owner-1").await.unwrap().unwrap();
        assert_eq!(found.stored_secret, "n3w");
        assert_eq!(found.size_mb, 12.25);

        assert!(store.delete(created.id, "owner-1").await.unwrap());
        assert!(store.find(created.id, "owner-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_and_stats() {
        let store = SqliteCredentialStore::open_in_memory().await.unwrap();
        let first = store.insert(new_record("owner-1", "a")).await.unwrap();
        let second = store.insert(new_record("owner-1", "b")).await.unwrap();
        let mut pg = new_record("owner-1", "c");
        pg.engine_type = EngineType::Postgres;
        store.insert(pg).await.unwrap();
        store.insert(new_record("owner-2", "d")).await.unwrap();
        store.update_size(first.id, "owner-1", 2.5).await.unwrap();
        store.update_size(second.id, "owner-1", 1.0).await.unwrap();

        let listed = store.list("owner-1").await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[2].id, first.id);

        let stats = store.stats("owner-1").await.unwrap();
        assert_eq!(
            stats,
            DatabaseStats {
                total_databases: 3,
                mysql_count: 2,
                postgres_count: 1,
                total_size_mb: 3.5,
            }
        );

        let empty = store.stats("nobody").await.unwrap();
        assert_eq!(empty, DatabaseStats::default());
    }
}
