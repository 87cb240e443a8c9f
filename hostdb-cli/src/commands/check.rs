//! `hostdb check` command - Run a query through the firewall only.

use hostdb_core::{CoreError, logging};
use hostdb_firewall::QueryFirewall;
use serde_json::json;

use crate::cli::CheckArgs;
use crate::config;
use crate::error::CliResult;
use crate::output;

use super::Context;

/// Run the check command
pub async fn run(ctx: &Context, args: CheckArgs) -> CliResult<()> {
    let config = config::load_or_default(&ctx.config_path, ctx.env.as_deref())?;
    logging::init_with_defaults(&config.logging);

    let firewall = QueryFirewall::new(config.firewall);
    match firewall.validate(&args.query, &args.database) {
        Ok(sql) => {
            if args.json {
                output::json(&json!({ "allowed": true, "query": sql }))?;
            } else {
                println!("{}", sql);
            }
            Ok(())
        }
        Err(e) => {
            if args.json {
                output::json(&json!({
                    "allowed": false,
                    "kind": e.code(),
                    "message": e.to_string(),
                }))?;
            }
            Err(CoreError::from(e).into())
        }
    }
}
