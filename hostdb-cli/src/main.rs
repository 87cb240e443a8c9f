//! hostdb CLI - Tenant database provisioning from the command line.

use clap::Parser;

use hostdb_cli::cli::{Cli, Command};
use hostdb_cli::commands::{self, Context};
use hostdb_cli::error::CliResult;
use hostdb_cli::output;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        output::newline();
        output::error(&format!("[{}] {}", e.code(), e));
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let ctx = Context::from_cli(&cli);

    match cli.command {
        Command::Check(args) => commands::check::run(&ctx, args).await,
        Command::Create(args) => commands::create::run(&ctx, args).await,
        Command::Delete(args) => commands::delete::run(&ctx, args).await,
        Command::Passwd(args) => commands::passwd::run(&ctx, args).await,
        Command::Query(args) => commands::query::run(&ctx, args).await,
        Command::List(args) => commands::list::run(&ctx, args).await,
        Command::Stats(args) => commands::stats::run(&ctx, args).await,
        Command::Size(args) => commands::size::run(&ctx, args).await,
        Command::Version => commands::version::run().await,
    }
}
