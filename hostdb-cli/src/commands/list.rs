//! `hostdb list` command - List an owner's databases.

use crate::cli::OwnerArgs;
use crate::error::CliResult;
use crate::output;

use super::Context;

/// Run the list command
pub async fn run(ctx: &Context, args: OwnerArgs) -> CliResult<()> {
    let hostdb = ctx.connect().await?;
    let result = hostdb.list_databases(&args.owner.owner).await;
    hostdb.shutdown().await;
    let databases = result?;

    if args.json {
        output::json(&databases)?;
        return Ok(());
    }

    if databases.is_empty() {
        output::info("No databases");
        return Ok(());
    }

    output::header("Databases");
    for db in &databases {
        output::list_item(&format!(
            "#{} {} ({}, user {}, {:.2} MB, created {})",
            db.id,
            db.db_name,
            db.engine_type,
            db.db_user,
            db.size_mb,
            db.created_at.format("%Y-%m-%d %H:%M")
        ));
    }
    Ok(())
}
