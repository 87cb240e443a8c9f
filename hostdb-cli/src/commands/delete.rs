//! `hostdb delete` command - Drop a tenant database.

use crate::cli::DeleteArgs;
use crate::error::{CliError, CliResult};
use crate::output::{self, success};

use super::Context;

/// Run the delete command
pub async fn run(ctx: &Context, args: DeleteArgs) -> CliResult<()> {
    let hostdb = ctx.connect().await?;
    let owner = args.owner.owner.as_str();

    let db = match hostdb.get_database(owner, args.id).await {
        Ok(db) => db,
        Err(e) => {
            hostdb.shutdown().await;
            return Err(e.into());
        }
    };

    if !args.force
        && !output::confirm(&format!(
            "Drop database '{}' and user '{}'?",
            db.db_name, db.db_user
        ))
    {
        hostdb.shutdown().await;
        return Err(CliError::Command("aborted".to_string()));
    }

    let result = hostdb.delete_database(owner, args.id, ctx.deadline()?).await;
    hostdb.shutdown().await;
    result?;

    success(&format!("Deleted {}", db.db_name));
    Ok(())
}
