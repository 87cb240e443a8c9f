//! `hostdb passwd` command - Rotate a tenant password.

use hostdb_core::ChangePasswordRequest;

use crate::cli::PasswdArgs;
use crate::error::CliResult;
use crate::output::success;

use super::Context;

/// Run the passwd command
pub async fn run(ctx: &Context, args: PasswdArgs) -> CliResult<()> {
    let hostdb = ctx.connect().await?;
    let request = ChangePasswordRequest {
        new_password: args.password,
    };

    let result = hostdb
        .change_password(&args.owner.owner, args.id, &request, ctx.deadline()?)
        .await;
    hostdb.shutdown().await;
    result?;

    success("Password changed");
    Ok(())
}
