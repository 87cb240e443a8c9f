//! Locating and loading `hostdb.toml`.

use std::path::Path;
use std::time::Duration;

use hostdb_core::{Deadline, HostDbConfig, parse_duration};

use crate::error::{CliError, CliResult};

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "hostdb.toml";

/// Load the configuration, applying the named environment's overrides.
pub fn load(path: &Path, env: Option<&str>) -> CliResult<HostDbConfig> {
    if !path.exists() {
        return Err(CliError::Config(format!(
            "config file not found: {}",
            path.display()
        )));
    }
    let config = HostDbConfig::from_file(path)?;
    apply_env(config, env)
}

/// Like [`load`], but a missing file yields the defaults. Used by commands
/// that never reach the engine.
pub fn load_or_default(path: &Path, env: Option<&str>) -> CliResult<HostDbConfig> {
    if path.exists() {
        load(path, env)
    } else {
        apply_env(HostDbConfig::default(), env)
    }
}

fn apply_env(config: HostDbConfig, env: Option<&str>) -> CliResult<HostDbConfig> {
    match env {
        Some(env) => Ok(config.with_environment(env)?),
        None => Ok(config),
    }
}

/// Parse the `--timeout` flag into a deadline starting now.
pub fn deadline(timeout: &str) -> CliResult<Deadline> {
    let duration: Duration =
        parse_duration(timeout).map_err(|e| CliError::Config(format!("--timeout: {}", e)))?;
    Ok(Deadline::after(duration))
}
