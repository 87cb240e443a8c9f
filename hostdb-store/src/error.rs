//! Error types for the metadata store.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type for store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("duplicate value: {0}")]
    Duplicate(String),

    /// SQLite driver error.
    #[error("SQLite error: {0}")]
    Sqlite(tokio_rusqlite::Error),

    /// A stored value could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Create a corrupt-record error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error is a unique-constraint violation.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}

impl From<tokio_rusqlite::Error> for StoreError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        match err {
            tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(code, message))
                if is_uniqueness_violation(&code) =>
            {
                Self::Duplicate(message.unwrap_or_else(|| code.to_string()))
            }
            other => Self::Sqlite(other),
        }
    }
}

/// UNIQUE and PRIMARY KEY failures only; NOT NULL, CHECK and foreign key
/// failures are bugs, not name collisions.
fn is_uniqueness_violation(code: &rusqlite::ffi::Error) -> bool {
    matches!(
        code.extended_code,
        rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::from(tokio_rusqlite::Error::Rusqlite(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_violation_is_duplicate() {
        let failure = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE),
            Some("UNIQUE constraint failed: tenant_databases.db_name".to_string()),
        );
        let err = StoreError::from(failure);
        assert!(err.is_duplicate());
        assert!(err.to_string().contains("tenant_databases.db_name"));
    }

    #[test]
    fn test_other_constraints_are_not_duplicates() {
        for code in [
            rusqlite::ffi::SQLITE_CONSTRAINT_NOTNULL,
            rusqlite::ffi::SQLITE_CONSTRAINT_CHECK,
            rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
        ] {
            let failure = rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None);
            let err = StoreError::from(failure);
            assert!(!err.is_duplicate(), "extended code {code}");
            assert!(matches!(err, StoreError::Sqlite(_)));
        }
    }

    #[test]
    fn test_engine_constraint_failures_classified() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE, \
             size REAL NOT NULL CHECK (size >= 0));
             INSERT INTO t (id, name, size) VALUES (1, 'a', 0);",
        )
        .unwrap();

        let insert = |sql: &str| StoreError::from(conn.execute(sql, []).unwrap_err());
        assert!(insert("INSERT INTO t (id, name, size) VALUES (2, 'a', 0)").is_duplicate());
        assert!(insert("INSERT INTO t (id, name, size) VALUES (1, 'b', 0)").is_duplicate());
        assert!(!insert("INSERT INTO t (id, name, size) VALUES (3, NULL, 0)").is_duplicate());
        assert!(!insert("INSERT INTO t (id, name, size) VALUES (4, 'c', -1)").is_duplicate());
    }

    #[test]
    fn test_other_failures_pass_through() {
        let err = StoreError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(!err.is_duplicate());
        assert!(err.to_string().starts_with("SQLite error"));
    }
}
