//! CLI error types and result alias.

use hostdb_core::CoreError;
use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(hostdb::cli::io))]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(code(hostdb::cli::config), help("pass --config or set HOSTDB_CONFIG"))]
    Config(String),

    /// Error from the hostdb core
    #[error(transparent)]
    #[diagnostic(transparent)]
    Core(#[from] CoreError),

    /// Output serialization error
    #[error("Output error: {0}")]
    #[diagnostic(code(hostdb::cli::output))]
    Output(#[from] serde_json::Error),

    /// Command error
    #[error("Command error: {0}")]
    #[diagnostic(code(hostdb::cli::command))]
    Command(String),
}

impl CliError {
    /// Stable code, shared with the core taxonomy where one applies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Config(_) => "config",
            Self::Core(e) => e.code(),
            Self::Output(_) => "output",
            Self::Command(_) => "command",
        }
    }
}
