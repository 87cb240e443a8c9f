//! `hostdb query` command - Execute SQL as the tenant.

use hostdb_core::ExecuteQueryRequest;

use crate::cli::QueryArgs;
use crate::error::CliResult;
use crate::output;

use super::Context;

/// Run the query command
pub async fn run(ctx: &Context, args: QueryArgs) -> CliResult<()> {
    let hostdb = ctx.connect().await?;
    let request = ExecuteQueryRequest {
        query: args.sql,
        password: args.password,
    };

    let result = hostdb
        .execute_query(&args.owner.owner, args.id, &request, ctx.deadline()?)
        .await;
    hostdb.shutdown().await;
    let outcome = result?;

    if args.json {
        output::json(&outcome)?;
        return Ok(());
    }

    print!("{}", output::render_table(&outcome.columns, &outcome.rows));
    output::dim(&outcome.message);
    Ok(())
}
