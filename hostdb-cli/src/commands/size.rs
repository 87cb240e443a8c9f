//! `hostdb size` command - Re-measure a database.

use crate::cli::IdArgs;
use crate::error::CliResult;
use crate::output::success;

use super::Context;

/// Run the size command
pub async fn run(ctx: &Context, args: IdArgs) -> CliResult<()> {
    let hostdb = ctx.connect().await?;
    let result = hostdb
        .refresh_size(&args.owner.owner, args.id, ctx.deadline()?)
        .await;
    hostdb.shutdown().await;

    success(&format!("{:.2} MB", result?));
    Ok(())
}
