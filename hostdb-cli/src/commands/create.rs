//! `hostdb create` command - Provision a tenant database.

use hostdb_core::CreateDatabaseRequest;

use crate::cli::CreateArgs;
use crate::error::CliResult;
use crate::output::{self, kv, success};

use super::Context;

/// Run the create command
pub async fn run(ctx: &Context, args: CreateArgs) -> CliResult<()> {
    let hostdb = ctx.connect().await?;
    let request = CreateDatabaseRequest {
        database_name: args.name,
        database_user: args.user,
        database_password: args.password,
        database_type: args.engine.into(),
        charset: args.charset,
        collation: args.collation,
    };

    let result = hostdb
        .create_database(&args.owner.owner, &request, ctx.deadline()?)
        .await;
    hostdb.shutdown().await;
    let db = result?;

    if args.json {
        output::json(&db)?;
        return Ok(());
    }

    success("Database created");
    kv("Id", &db.id.to_string());
    kv("Database", &db.db_name);
    kv("User", &db.db_user);
    kv("Engine", db.engine_type.as_str());
    kv("Charset", &db.charset);
    kv("Collation", &db.collation);
    Ok(())
}
