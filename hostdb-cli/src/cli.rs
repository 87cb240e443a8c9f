//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use hostdb_store::EngineType;

use crate::config::CONFIG_FILE_NAME;

/// hostdb - tenant database provisioning on a shared MySQL engine
#[derive(Parser, Debug)]
#[command(name = "hostdb")]
#[command(version)]
#[command(about = "hostdb - tenant database provisioning and query firewall", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to hostdb.toml
    #[arg(short, long, global = true, env = "HOSTDB_CONFIG", default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Environment whose overrides apply
    #[arg(long, global = true, env = "HOSTDB_ENV")]
    pub env: Option<String>,

    /// Deadline for engine calls (e.g. 500ms, 30s, 2m)
    #[arg(long, global = true, default_value = "30s")]
    pub timeout: String,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a query through the firewall without touching the engine
    Check(CheckArgs),

    /// Provision a tenant database and user
    Create(CreateArgs),

    /// Drop a tenant database, its user and its record
    Delete(DeleteArgs),

    /// Rotate a tenant password
    Passwd(PasswdArgs),

    /// Execute a query as the tenant
    Query(QueryArgs),

    /// List an owner's databases
    List(OwnerArgs),

    /// Show an owner's aggregates
    Stats(OwnerArgs),

    /// Re-measure a database's size
    Size(IdArgs),

    /// Display version information
    Version,
}

/// The owner every data command acts for.
#[derive(Args, Debug, Clone)]
pub struct Owner {
    /// Owner id, as resolved by the identity provider
    #[arg(long, env = "HOSTDB_OWNER")]
    pub owner: String,
}

/// Arguments for the `check` command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// SQL to validate
    pub query: String,

    /// Database the query would target
    #[arg(short, long, default_value = "tenant")]
    pub database: String,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Supported engines
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum Engine {
    #[default]
    Mysql,
    Postgres,
}

impl From<Engine> for EngineType {
    fn from(engine: Engine) -> Self {
        match engine {
            Engine::Mysql => EngineType::Mysql,
            Engine::Postgres => EngineType::Postgres,
        }
    }
}

/// Arguments for the `create` command
#[derive(Args, Debug)]
pub struct CreateArgs {
    #[command(flatten)]
    pub owner: Owner,

    /// Requested database name; the owner prefix is added
    pub name: String,

    /// Requested user name; the owner prefix is added
    pub user: String,

    /// Tenant password
    #[arg(short, long, env = "HOSTDB_TENANT_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Engine to provision on
    #[arg(short, long, default_value = "mysql")]
    pub engine: Engine,

    /// Character set (engine default when omitted)
    #[arg(long)]
    pub charset: Option<String>,

    /// Collation (engine default when omitted)
    #[arg(long)]
    pub collation: Option<String>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `delete` command
#[derive(Args, Debug)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub owner: Owner,

    /// Database id
    pub id: i64,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    pub force: bool,
}

/// Arguments for the `passwd` command
#[derive(Args, Debug)]
pub struct PasswdArgs {
    #[command(flatten)]
    pub owner: Owner,

    /// Database id
    pub id: i64,

    /// New tenant password
    #[arg(short, long, env = "HOSTDB_TENANT_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments for the `query` command
#[derive(Args, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    pub owner: Owner,

    /// Database id
    pub id: i64,

    /// SQL to execute
    pub sql: String,

    /// Tenant password (the stored secret when omitted)
    #[arg(short, long)]
    pub password: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for commands scoped to one owner
#[derive(Args, Debug)]
pub struct OwnerArgs {
    #[command(flatten)]
    pub owner: Owner,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Arguments for commands scoped to one database
#[derive(Args, Debug)]
pub struct IdArgs {
    #[command(flatten)]
    pub owner: Owner,

    /// Database id
    pub id: i64,
}
