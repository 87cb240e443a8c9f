//! Logging setup for hostdb binaries.
//!
//! Library code only emits `tracing` events. A binary calls [`init`] (or
//! [`init_with_defaults`] to fall back on `[logging]` from `hostdb.toml`)
//! once at startup; it installs a `tracing-subscriber` registry when the
//! `tracing-subscriber` feature is enabled.
//!
//! # Environment Variables
//!
//! - `HOSTDB_DEBUG=true|1|yes` - Enable debug logging
//! - `HOSTDB_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `HOSTDB_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! Events never carry passwords. Fields used across crates: `owner_id`,
//! `db_name`, `db_user`, `step`.

use std::env;
use std::sync::Once;

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Check if debug logging is enabled via `HOSTDB_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("HOSTDB_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

fn normalize_level(level: &str) -> Option<&'static str> {
    let level = level.to_lowercase();
    LEVELS.iter().copied().find(|l| *l == level)
}

fn normalize_format(format: &str) -> &'static str {
    match format.to_lowercase().as_str() {
        "pretty" => "pretty",
        "compact" => "compact",
        _ => "json",
    }
}

/// Resolve the level: `HOSTDB_LOG_LEVEL`, then `HOSTDB_DEBUG`, then the
/// configured default, then `warn`.
pub fn resolve_level(defaults: &LoggingConfig) -> &'static str {
    if let Some(level) = env::var("HOSTDB_LOG_LEVEL")
        .ok()
        .and_then(|l| normalize_level(&l))
    {
        return level;
    }
    if is_debug_enabled() {
        return "debug";
    }
    defaults
        .level
        .as_deref()
        .and_then(normalize_level)
        .unwrap_or("warn")
}

/// Resolve the format: `HOSTDB_LOG_FORMAT`, then the configured default,
/// then `json`.
pub fn resolve_format(defaults: &LoggingConfig) -> &'static str {
    env::var("HOSTDB_LOG_FORMAT")
        .ok()
        .or_else(|| defaults.format.clone())
        .map(|f| normalize_format(&f))
        .unwrap_or("json")
}

/// Initialize logging from the environment only.
///
/// Nothing is installed unless `HOSTDB_DEBUG` or `HOSTDB_LOG_LEVEL` is set.
pub fn init() {
    if !is_debug_enabled() && env::var("HOSTDB_LOG_LEVEL").is_err() {
        return;
    }
    init_with_defaults(&LoggingConfig::default());
}

/// Initialize logging, falling back on `defaults` where the environment is
/// silent. Subsequent calls are no-ops.
pub fn init_with_defaults(defaults: &LoggingConfig) {
    INIT.call_once(|| {
        let level = resolve_level(defaults);
        let format = resolve_format(defaults);

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter = EnvFilter::try_new(format!(
                "hostdb={level},hostdb_core={level},hostdb_mysql={level},\
                 hostdb_store={level},hostdb_firewall={level},hostdb_cli={level}"
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            // stderr keeps command output on stdout machine-readable.
            match format {
                "json" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().json().with_writer(std::io::stderr))
                        .init();
                }
                "compact" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().compact().with_writer(std::io::stderr))
                        .init();
                }
                _ => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().pretty().with_writer(std::io::stderr))
                        .init();
                }
            }

            tracing::info!(level, format, "hostdb logging initialized");
        }

        #[cfg(not(feature = "tracing-subscriber"))]
        {
            let _ = (level, format);
        }
    });
}
