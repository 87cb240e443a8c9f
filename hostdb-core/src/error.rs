//! The error taxonomy surfaced at the hostdb boundary.

// Fields are read by the derive macros.
#![allow(unused_assignments)]

use hostdb_firewall::{ValidationError, ValidationKind};
use hostdb_mysql::MysqlError;
use hostdb_store::{EngineType, StoreError};
use miette::Diagnostic;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors returned by provisioning, execution and configuration.
#[derive(Error, Debug, Diagnostic)]
pub enum CoreError {
    /// No record with that id belongs to the caller.
    #[error("database not found")]
    #[diagnostic(code(hostdb::not_found))]
    NotFound,

    /// The firewall refused the query.
    #[error("{0}")]
    #[diagnostic(code(hostdb::validation))]
    Validation(#[from] ValidationError),

    /// A provisioning statement failed; completed steps were compensated.
    #[error("provisioning failed at `{step}`: {source}")]
    #[diagnostic(code(hostdb::provisioning))]
    Provisioning {
        step: String,
        #[source]
        source: MysqlError,
    },

    /// No usable secret for the tenant account.
    #[error("credential error: {0}")]
    #[diagnostic(code(hostdb::credential))]
    Credential(String),

    /// The record's engine does not support the operation.
    #[error("{0} databases do not support this operation")]
    #[diagnostic(code(hostdb::unsupported_engine))]
    UnsupportedEngine(EngineType),

    /// The engine could not be reached or refused the tenant login.
    #[error("connection error: {}", .0.engine_message())]
    #[diagnostic(code(hostdb::connection))]
    Connection(#[source] MysqlError),

    /// A name, password or option failed validation.
    #[error("invalid input: {0}")]
    #[diagnostic(code(hostdb::invalid_input))]
    InvalidInput(String),

    /// The derived database name or user is already recorded.
    #[error("{0} already exists")]
    #[diagnostic(code(hostdb::already_exists))]
    AlreadyExists(String),

    /// The engine ran the query and reported an error.
    #[error("query failed: {0}")]
    #[diagnostic(code(hostdb::query_failed))]
    QueryFailed(String),

    /// The caller's deadline expired.
    #[error("{0} timed out")]
    #[diagnostic(code(hostdb::timeout))]
    Timeout(String),

    /// The metadata store failed.
    #[error("metadata store error: {0}")]
    #[diagnostic(code(hostdb::store))]
    Store(#[from] StoreError),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(hostdb::config), help("check hostdb.toml"))]
    Config(String),
}

impl CoreError {
    /// Create an invalid-input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a timeout error naming the operation.
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout(operation.into())
    }

    /// Stable code for UI rendering.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Validation(_) => "validation",
            Self::Provisioning { .. } => "provisioning",
            Self::Credential(_) => "credential",
            Self::UnsupportedEngine(_) => "unsupported_engine",
            Self::Connection(_) => "connection",
            Self::InvalidInput(_) => "invalid_input",
            Self::AlreadyExists(_) => "already_exists",
            Self::QueryFailed(_) => "query_failed",
            Self::Timeout(_) => "timeout",
            Self::Store(_) => "store",
            Self::Config(_) => "config",
        }
    }

    /// The firewall kind, for validation errors.
    pub fn validation_kind(&self) -> Option<ValidationKind> {
        match self {
            Self::Validation(e) => Some(e.kind),
            _ => None,
        }
    }
}
