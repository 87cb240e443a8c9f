//! Records kept in the metadata store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Engine a tenant database is hosted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineType {
    /// MySQL, provisioned and queryable.
    Mysql,
    /// PostgreSQL, recorded but not provisioned.
    Postgres,
}

impl EngineType {
    /// Stored and wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
        }
    }

    /// Character set used when the request leaves it blank.
    pub fn default_charset(&self) -> &'static str {
        match self {
            Self::Mysql => "utf8mb4",
            Self::Postgres => "UTF8",
        }
    }

    /// Collation used when the request leaves it blank.
    pub fn default_collation(&self) -> &'static str {
        match self {
            Self::Mysql => "utf8mb4_unicode_ci",
            Self::Postgres => "en_US.UTF-8",
        }
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown engine name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported engine type '{0}'")]
pub struct ParseEngineTypeError(pub String);

impl FromStr for EngineType {
    type Err = ParseEngineTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::Mysql),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            _ => Err(ParseEngineTypeError(s.to_string())),
        }
    }
}

/// A provisioned tenant database.
#[derive(Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantDatabase {
    pub id: i64,
    pub owner_id: String,
    pub db_name: String,
    pub db_user: String,
    pub engine_type: EngineType,
    pub charset: String,
    pub collation: String,
    /// Secret used when a query does not supply one. May be empty.
    #[serde(skip)]
    pub stored_secret: String,
    #[serde(rename = "sizeMB")]
    pub size_mb: f64,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for TenantDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantDatabase")
            .field("id", &self.id)
            .field("owner_id", &self.owner_id)
            .field("db_name", &self.db_name)
            .field("db_user", &self.db_user)
            .field("engine_type", &self.engine_type)
            .field("charset", &self.charset)
            .field("collation", &self.collation)
            .field("stored_secret", &"***")
            .field("size_mb", &self.size_mb)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Fields supplied when recording a new tenant database.
#[derive(Clone)]
pub struct NewTenantDatabase {
    pub owner_id: String,
    pub db_name: String,
    pub db_user: String,
    pub engine_type: EngineType,
    pub charset: String,
    pub collation: String,
    pub stored_secret: String,
}

/// Per-owner aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub total_databases: u64,
    pub mysql_count: u64,
    pub postgres_count: u64,
    #[serde(rename = "totalSizeMB")]
    pub total_size_mb: f64,
}
