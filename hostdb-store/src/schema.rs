//! Metadata schema, applied on every open.

/// Idempotent DDL for the metadata tables.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS owner_prefixes (
    owner_id   TEXT PRIMARY KEY NOT NULL,
    token      TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tenant_databases (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id      TEXT NOT NULL,
    db_name       TEXT NOT NULL UNIQUE,
    db_user       TEXT NOT NULL UNIQUE,
    engine_type   TEXT NOT NULL,
    charset       TEXT NOT NULL,
    collation     TEXT NOT NULL,
    stored_secret TEXT NOT NULL DEFAULT '',
    size_mb       REAL NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tenant_databases_owner ON tenant_databases (owner_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
                 AND name IN ('owner_prefixes', 'tenant_databases')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }
}
