//! Store configuration.

use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};

/// Where the metadata database lives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DatabasePath {
    /// In-memory database, gone when the store is dropped.
    #[default]
    Memory,
    /// File-based database.
    File(PathBuf),
}

impl DatabasePath {
    /// Check if this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }

    /// Printable form for logs.
    pub fn display(&self) -> String {
        match self {
            Self::Memory => ":memory:".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

/// Metadata store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Database location.
    pub path: DatabasePath,
    /// Use write-ahead logging (file databases only).
    pub wal_mode: bool,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: Option<u32>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: DatabasePath::Memory,
            wal_mode: true,
            busy_timeout_ms: Some(5000),
        }
    }
}

impl StoreConfig {
    /// In-memory configuration.
    pub fn memory() -> Self {
        Self::default()
    }

    /// File-backed configuration.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            path: DatabasePath::File(path.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    /// Interpret a configured path; `:memory:` selects the in-memory store.
    pub fn from_path_str(path: &str) -> StoreResult<Self> {
        match path.trim() {
            "" => Err(StoreError::config("store path is empty")),
            ":memory:" | "sqlite::memory:" => Ok(Self::memory()),
            other => Ok(Self::file(other.strip_prefix("sqlite://").unwrap_or(other))),
        }
    }

    /// Set the busy timeout.
    pub fn busy_timeout_ms(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = Some(ms);
        self
    }

    /// Enable or disable WAL.
    pub fn wal_mode(mut self, enabled: bool) -> Self {
        self.wal_mode = enabled;
        self
    }

    /// Pragmas applied to every new connection.
    pub fn init_sql(&self) -> String {
        let mut sql = String::new();

        if self.wal_mode && !self.path.is_memory() {
            sql.push_str("PRAGMA journal_mode = WAL;\n");
            sql.push_str("PRAGMA synchronous = NORMAL;\n");
        }

        if let Some(timeout) = self.busy_timeout_ms {
            sql.push_str(&format!("PRAGMA busy_timeout = {};\n", timeout));
        }

        sql
    }
}
