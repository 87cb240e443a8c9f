//! CLI command implementations.

use std::path::PathBuf;

use hostdb_core::{Deadline, HostDb, HostDbConfig, logging};

use crate::cli::Cli;
use crate::config;
use crate::error::CliResult;

pub mod check;
pub mod create;
pub mod delete;
pub mod list;
pub mod passwd;
pub mod query;
pub mod size;
pub mod stats;
pub mod version;

/// Global options shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config_path: PathBuf,
    pub env: Option<String>,
    pub timeout: String,
}

impl Context {
    /// Capture the global flags.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            config_path: cli.config.clone(),
            env: cli.env.clone(),
            timeout: cli.timeout.clone(),
        }
    }

    /// Load the configuration file, which must exist, and start logging.
    pub fn config(&self) -> CliResult<HostDbConfig> {
        let config = config::load(&self.config_path, self.env.as_deref())?;
        logging::init_with_defaults(&config.logging);
        Ok(config)
    }

    /// Connect to the engine and the metadata store.
    pub async fn connect(&self) -> CliResult<HostDb> {
        Ok(HostDb::connect(self.config()?).await?)
    }

    /// Deadline for this invocation's engine calls.
    pub fn deadline(&self) -> CliResult<Deadline> {
        config::deadline(&self.timeout)
    }
}
