//! `hostdb stats` command - Show an owner's aggregates.

use crate::cli::OwnerArgs;
use crate::error::CliResult;
use crate::output::{self, kv};

use super::Context;

/// Run the stats command
pub async fn run(ctx: &Context, args: OwnerArgs) -> CliResult<()> {
    let hostdb = ctx.connect().await?;
    let result = hostdb.stats(&args.owner.owner).await;
    hostdb.shutdown().await;
    let stats = result?;

    if args.json {
        output::json(&stats)?;
        return Ok(());
    }

    output::section("Databases");
    kv("Total", &stats.total_databases.to_string());
    kv("MySQL", &stats.mysql_count.to_string());
    kv("PostgreSQL", &stats.postgres_count.to_string());
    kv("Size", &format!("{:.2} MB", stats.total_size_mb));
    Ok(())
}
