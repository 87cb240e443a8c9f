//! File-backed store behaviour: persistence across reopen and concurrent
//! prefix claims.

use std::sync::Arc;

use hostdb_store::{CredentialStore, EngineType, NewTenantDatabase, SqliteCredentialStore, StoreConfig};
use tempfile::TempDir;

fn record(owner: &str, db: &str, user: &str) -> NewTenantDatabase {
    NewTenantDatabase {
        owner_id: owner.to_string(),
        db_name: db.to_string(),
        db_user: user.to_string(),
        engine_type: EngineType::Mysql,
        charset: "utf8mb4".to_string(),
        collation: "utf8mb4_unicode_ci".to_string(),
        stored_secret: String::new(),
    }
}

#[tokio::test]
async fn test_records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let config = StoreConfig::file(dir.path().join("nested").join("hostdb.db"));

    let store = SqliteCredentialStore::open(&config).await.unwrap();
    store.claim_owner_prefix("owner-1", "0a1b2c").await.unwrap();
    let created = store
        .insert(record("owner-1", "0a1b2c_shop", "0a1b2c_app"))
        .await
        .unwrap();
    store.close().await.unwrap();

    let reopened = SqliteCredentialStore::open(&config).await.unwrap();
    assert_eq!(
        reopened.owner_prefix("owner-1").await.unwrap().as_deref(),
        Some("0a1b2c")
    );
    let found = reopened.find(created.id, "owner-1").await.unwrap().unwrap();
    assert_eq!(found.db_user, "0a1b2c_app");
    assert!(found.stored_secret.is_empty());
}

#[tokio::test]
async fn test_concurrent_claims_converge() {
    let store = Arc::new(SqliteCredentialStore::open_in_memory().await.unwrap());

    let mut tasks = Vec::new();
    for token in ["aaaaaa", "bbbbbb", "cccccc", "dddddd"] {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            store.claim_owner_prefix("owner-1", token).await.unwrap()
        }));
    }

    let mut winners = Vec::new();
    for task in tasks {
        winners.push(task.await.unwrap());
    }
    winners.dedup();
    assert_eq!(winners.len(), 1);
    assert_eq!(
        store.owner_prefix("owner-1").await.unwrap(),
        Some(winners[0].clone())
    );
}
