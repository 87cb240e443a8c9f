//! Configuration file parsing for `hostdb.toml`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use hostdb_firewall::FirewallPolicy;
use hostdb_mysql::{MysqlConfig, PoolConfig};
use hostdb_store::StoreConfig;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::naming::PasswordPolicy;

static ENV_VAR: LazyLock<regex_lite::Regex> =
    LazyLock::new(|| regex_lite::Regex::new(r"\$\{([^}]+)\}").expect("valid pattern"));

/// Main configuration structure for `hostdb.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HostDbConfig {
    /// Engine endpoints.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Per-tenant pool limits.
    #[serde(default)]
    pub pool: PoolSettings,

    /// Query firewall limits.
    #[serde(default)]
    pub firewall: FirewallPolicy,

    /// Provisioning policy.
    #[serde(default)]
    pub provisioning: ProvisioningConfig,

    /// Metadata store.
    #[serde(default)]
    pub store: StoreSettings,

    /// Logging defaults; `HOSTDB_*` environment variables win.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverride>,
}

impl HostDbConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::config(format!("failed to read {}: {}", path.display(), e)))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> CoreResult<Self> {
        let expanded = expand_env_vars(content);

        let config: Self = toml::from_str(&expanded)
            .map_err(|e| CoreError::config(format!("invalid hostdb.toml: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-specific overrides.
    pub fn with_environment(mut self, env: &str) -> CoreResult<Self> {
        if let Some(overrides) = self.environments.remove(env) {
            if let Some(engine) = overrides.engine {
                if let Some(url) = engine.admin_url {
                    self.engine.admin_url = Some(url);
                }
                if let Some(host) = engine.tenant_host {
                    self.engine.tenant_host = Some(host);
                }
                if let Some(port) = engine.tenant_port {
                    self.engine.tenant_port = Some(port);
                }
            }
            if let Some(pool) = overrides.pool {
                self.pool = pool;
            }
            if let Some(firewall) = overrides.firewall {
                self.firewall = firewall;
            }
            if let Some(store) = overrides.store {
                self.store = store;
            }
            if let Some(logging) = overrides.logging {
                self.logging = logging;
            }
            self.validate()?;
        }
        Ok(self)
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> CoreResult<()> {
        parse_duration(&self.engine.connect_timeout)?;
        parse_duration(&self.pool.max_lifetime)?;
        parse_duration(&self.provisioning.statement_timeout)?;
        parse_duration(&self.provisioning.compensation_timeout)?;

        if self.pool.max_open == 0 {
            return Err(CoreError::config("pool.max_open must be at least 1"));
        }
        if self.pool.max_idle > self.pool.max_open {
            return Err(CoreError::config(format!(
                "pool.max_idle ({}) exceeds pool.max_open ({})",
                self.pool.max_idle, self.pool.max_open
            )));
        }
        if let Some(url) = &self.engine.admin_url {
            MysqlConfig::from_url(url).map_err(|e| CoreError::config(e.to_string()))?;
        }
        Ok(())
    }

    /// Connection settings for the administrative account.
    pub fn admin_mysql_config(&self) -> CoreResult<MysqlConfig> {
        let url = self
            .engine
            .admin_url
            .as_deref()
            .ok_or_else(|| CoreError::config("engine.admin_url is not set"))?;
        let config = MysqlConfig::from_url(url).map_err(|e| CoreError::config(e.to_string()))?;
        Ok(config.connect_timeout(parse_duration(&self.engine.connect_timeout)?))
    }

    /// Endpoint template for tenant handles: the admin endpoint unless
    /// `tenant_host`/`tenant_port` say otherwise, never the admin account.
    pub fn tenant_endpoint(&self) -> CoreResult<MysqlConfig> {
        let admin = self.admin_mysql_config()?;
        let mut endpoint = MysqlConfig::new(
            self.engine.tenant_host.clone().unwrap_or(admin.host),
            self.engine.tenant_port.unwrap_or(admin.port),
        )
        .ssl_mode(admin.ssl_mode);
        endpoint.connect_timeout = admin.connect_timeout;
        Ok(endpoint)
    }

    /// Pool limits for one tenant handle.
    pub fn tenant_pool_config(&self) -> CoreResult<PoolConfig> {
        Ok(PoolConfig {
            max_connections: self.pool.max_open,
            min_connections: self.pool.max_idle,
            max_lifetime: Some(parse_duration(&self.pool.max_lifetime)?),
            connection_timeout: Some(parse_duration(&self.engine.connect_timeout)?),
            ..PoolConfig::tenant()
        })
    }

    /// Metadata store settings.
    pub fn store_config(&self) -> CoreResult<StoreConfig> {
        StoreConfig::from_path_str(&self.store.path).map_err(|e| CoreError::config(e.to_string()))
    }

    /// Password rules for create and change-password.
    pub fn password_policy(&self) -> PasswordPolicy {
        PasswordPolicy {
            min_length: self.provisioning.min_password_length,
        }
    }
}

/// Engine endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Administrative connection URL (supports `${ENV_VAR}` interpolation).
    pub admin_url: Option<String>,

    /// Host tenants connect to, when it differs from the admin host.
    pub tenant_host: Option<String>,

    /// Port tenants connect to, when it differs from the admin port.
    pub tenant_port: Option<u16>,

    /// Host part of provisioned accounts.
    #[serde(default = "default_user_host")]
    pub user_host: String,

    /// Connect timeout for every engine handle.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            admin_url: None,
            tenant_host: None,
            tenant_port: None,
            user_host: default_user_host(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

fn default_user_host() -> String {
    "%".to_string()
}

fn default_connect_timeout() -> String {
    "10s".to_string()
}

/// Per-tenant pool limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum open connections per tenant.
    #[serde(default = "default_max_open")]
    pub max_open: usize,

    /// Idle connections kept per tenant.
    #[serde(default = "default_max_idle")]
    pub max_idle: usize,

    /// Maximum connection lifetime.
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime: String,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_open: default_max_open(),
            max_idle: default_max_idle(),
            max_lifetime: default_max_lifetime(),
        }
    }
}

fn default_max_open() -> usize {
    5
}

fn default_max_idle() -> usize {
    2
}

fn default_max_lifetime() -> String {
    "5m".to_string()
}

/// Provisioning policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProvisioningConfig {
    /// Minimum tenant password length.
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    /// Upper bound for one provisioning statement.
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout: String,

    /// Upper bound for one compensating statement.
    #[serde(default = "default_compensation_timeout")]
    pub compensation_timeout: String,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            min_password_length: default_min_password_length(),
            statement_timeout: default_statement_timeout(),
            compensation_timeout: default_compensation_timeout(),
        }
    }
}

impl ProvisioningConfig {
    /// Parsed statement timeout.
    pub fn statement_timeout(&self) -> CoreResult<Duration> {
        parse_duration(&self.statement_timeout)
    }

    /// Parsed compensation timeout.
    pub fn compensation_timeout(&self) -> CoreResult<Duration> {
        parse_duration(&self.compensation_timeout)
    }
}

fn default_min_password_length() -> usize {
    6
}

fn default_statement_timeout() -> String {
    "30s".to_string()
}

fn default_compensation_timeout() -> String {
    "10s".to_string()
}

/// Metadata store location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSettings {
    /// SQLite file path, or `:memory:`.
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> String {
    "hostdb.db".to_string()
}

/// Logging defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`.
    pub level: Option<String>,

    /// `json`, `pretty` or `compact`.
    pub format: Option<String>,
}

/// Environment-specific overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentOverride {
    /// Engine endpoint overrides.
    pub engine: Option<EngineOverride>,

    /// Replacement pool limits.
    pub pool: Option<PoolSettings>,

    /// Replacement firewall limits.
    pub firewall: Option<FirewallPolicy>,

    /// Replacement store settings.
    pub store: Option<StoreSettings>,

    /// Replacement logging defaults.
    pub logging: Option<LoggingConfig>,
}

/// Engine endpoint overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineOverride {
    /// Override the administrative URL.
    pub admin_url: Option<String>,

    /// Override the tenant host.
    pub tenant_host: Option<String>,

    /// Override the tenant port.
    pub tenant_port: Option<u16>,
}

/// Parse `500ms`, `30s`, `5m`, `1h`; a bare number means seconds.
pub fn parse_duration(value: &str) -> CoreResult<Duration> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let amount: u64 = digits
        .parse()
        .map_err(|_| CoreError::config(format!("invalid duration '{}'", value)))?;

    match unit.trim() {
        "ms" => Ok(Duration::from_millis(amount)),
        "" | "s" => Ok(Duration::from_secs(amount)),
        "m" => Ok(Duration::from_secs(amount.saturating_mul(60))),
        "h" => Ok(Duration::from_secs(amount.saturating_mul(3600))),
        other => Err(CoreError::config(format!(
            "invalid duration unit '{}' in '{}'",
            other, value
        ))),
    }
}

fn expand_env_vars(content: &str) -> String {
    ENV_VAR
        .replace_all(content, |caps: &regex_lite::Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HostDbConfig::default();
        assert_eq!(config.engine.user_host, "%");
        assert_eq!(config.pool.max_open, 5);
        assert_eq!(config.pool.max_idle, 2);
        assert_eq!(config.pool.max_lifetime, "5m");
        assert_eq!(config.provisioning.min_password_length, 6);
        assert_eq!(config.firewall, FirewallPolicy::default());
        assert_eq!(config.store.path, "hostdb.db");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
            [engine]
            admin_url = "mysql://root:pw@db.internal:3306/"
        "#;

        let config = HostDbConfig::from_str(toml).unwrap();
        let admin = config.admin_mysql_config().unwrap();
        assert_eq!(admin.host, "db.internal");
        assert_eq!(admin.username.as_deref(), Some("root"));
        assert_eq!(admin.connect_timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_tenant_endpoint_drops_admin_account() {
        let toml = r#"
            [engine]
            admin_url = "mysql://root:pw@db.internal:3306/"
            tenant_host = "proxy.internal"
            tenant_port = 6033
        "#;

        let endpoint = HostDbConfig::from_str(toml).unwrap().tenant_endpoint().unwrap();
        assert_eq!(endpoint.host, "proxy.internal");
        assert_eq!(endpoint.port, 6033);
        assert!(endpoint.username.is_none());
        assert!(endpoint.password.is_none());
    }

    #[test]
    fn test_rejects_unknown_fields() {
        assert!(HostDbConfig::from_str("[pool]\nmax_conns = 3\n").is_err());
        assert!(HostDbConfig::from_str("[firewall]\nmax_rows = 3\n").is_err());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(HostDbConfig::from_str("[pool]\nmax_open = 0\n").is_err());
        assert!(HostDbConfig::from_str("[pool]\nmax_open = 2\nmax_idle = 3\n").is_err());
        assert!(HostDbConfig::from_str("[pool]\nmax_lifetime = \"soon\"\n").is_err());
        assert!(HostDbConfig::from_str("[engine]\nadmin_url = \"postgres://x/\"\n").is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("15").unwrap(), Duration::from_secs(15));
        assert!(parse_duration("5d").is_err());
        assert!(parse_duration("m").is_err());
    }

    #[test]
    fn test_env_var_expansion() {
        // SAFETY: the variable name is unique to this test.
        unsafe {
            std::env::set_var("HOSTDB_TEST_ADMIN_URL", "mysql://root@10.0.0.5/");
        }
        let expanded = expand_env_vars("admin_url = \"${HOSTDB_TEST_ADMIN_URL}\"");
        assert_eq!(expanded, "admin_url = \"mysql://root@10.0.0.5/\"");
        assert_eq!(
            expand_env_vars("x = \"${HOSTDB_TEST_UNSET_VAR}\""),
            "x = \"${HOSTDB_TEST_UNSET_VAR}\""
        );
        unsafe {
            std::env::remove_var("HOSTDB_TEST_ADMIN_URL");
        }
    }

    #[test]
    fn test_environment_override() {
        let toml = r#"
            [engine]
            admin_url = "mysql://root@localhost/"

            [environments.production.engine]
            admin_url = "mysql://root@db.prod/"

            [environments.production.pool]
            max_open = 10
            max_idle = 4
        "#;

        let config = HostDbConfig::from_str(toml)
            .unwrap()
            .with_environment("production")
            .unwrap();
        assert_eq!(config.admin_mysql_config().unwrap().host, "db.prod");
        assert_eq!(config.pool.max_open, 10);
        assert_eq!(config.tenant_pool_config().unwrap().min_connections, 4);
    }
}
